//! Macros for ergonomic machine construction.

/// Build a [`DeclarativeTable`](crate::table::DeclarativeTable) from
/// `code => expression` pairs.
///
/// # Example
///
/// ```
/// use flowstate::transitions;
///
/// let table = transitions! {
///     "NQIC" => "F:AQTS",
///     "ARTC" => "PQS",
///     "AQTS" => "NQIC",
/// };
///
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.get("NQIC"), Some("F:AQTS"));
/// ```
#[macro_export]
macro_rules! transitions {
    ($($code:expr => $expression:expr),* $(,)?) => {{
        let table = $crate::table::DeclarativeTable::new();
        $(
            let table = table.entry($code, $expression);
        )*
        table
    }};
}
