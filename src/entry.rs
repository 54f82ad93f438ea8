use std::panic::Location;

use chrono::NaiveDateTime;

use crate::severity::Severity;

/// Username recorded when the caller does not supply one.
pub const DEFAULT_USER: &str = "-";

/// Logical origin of a log call.
///
/// Origins are always supplied by the caller, either captured at compile time
/// with [`call_site!`](crate::call_site) or taken from a `#[track_caller]`
/// location. The logger never inspects the stack.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallSite {
    /// Declaring type or module path
    pub class_name: String,
    /// Enclosing function name
    pub method: String,
    /// Source line, if known
    pub line: Option<u32>,
}

impl CallSite {
    pub fn new(class_name: impl Into<String>, method: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            class_name: class_name.into(),
            method: method.into(),
            line,
        }
    }

    /// Splits a fully qualified function path such as
    /// `my_app::net::Server::accept` into `my_app::net::Server` and `accept`.
    ///
    /// Closure segments (`{{closure}}`) are dropped so that a call made from
    /// inside a closure reports the function that defined it.
    pub fn from_function_path(path: &str, line: u32) -> Self {
        let mut path = path;
        while let Some(stripped) = path.strip_suffix("::{{closure}}") {
            path = stripped;
        }
        let (class_name, method) = match path.rsplit_once("::") {
            Some((class_name, method)) => (class_name, method),
            None => ("", path),
        };
        Self::new(class_name, method, Some(line))
    }

    /// Builds a call site from a `#[track_caller]` location. The source file
    /// stands in for the class name; the method is unknown.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), "", Some(location.line()))
    }
}

/// Captures the enclosing function and line as a [`CallSite`].
///
/// ```
/// use daily_logger::call_site;
///
/// fn handler() -> daily_logger::CallSite {
///     call_site!()
/// }
///
/// let site = handler();
/// assert_eq!(site.method, "handler");
/// assert!(site.line.is_some());
/// ```
#[macro_export]
macro_rules! call_site {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        $crate::CallSite::from_function_path(
            name.strip_suffix("::__here").unwrap_or(name),
            line!(),
        )
    }};
}

/// A single pending log entry.
///
/// Built by the producer, moved into the queue, and dropped once the flush loop
/// has written it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub severity: Severity,
    pub message: String,
    pub call_site: Option<CallSite>,
    /// When the entry was created, not when it reached disk
    pub occurred_at: NaiveDateTime,
    pub user: String,
    pub permission: i32,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>, occurred_at: NaiveDateTime) -> Self {
        Self {
            severity,
            message: message.into(),
            call_site: None,
            occurred_at,
            user: DEFAULT_USER.to_string(),
            permission: 0,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>, permission: i32) -> Self {
        self.user = user.into();
        self.permission = permission;
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Probe;

    impl Probe {
        fn locate(&self) -> CallSite {
            crate::call_site!()
        }
    }

    #[test]
    fn test_function_path_split() {
        let site = CallSite::from_function_path("app::net::Server::accept", 12);
        assert_eq!(site.class_name, "app::net::Server");
        assert_eq!(site.method, "accept");
        assert_eq!(site.line, Some(12));
    }

    #[test]
    fn test_closure_segments_are_dropped() {
        let site = CallSite::from_function_path("app::run::{{closure}}::{{closure}}", 3);
        assert_eq!(site.class_name, "app");
        assert_eq!(site.method, "run");
    }

    #[test]
    fn test_bare_function_has_empty_class() {
        let site = CallSite::from_function_path("main", 1);
        assert_eq!(site.class_name, "");
        assert_eq!(site.method, "main");
    }

    #[test]
    fn test_macro_captures_method_on_type() {
        let site = Probe.locate();
        assert!(site.class_name.contains("Probe"), "{}", site.class_name);
        assert_eq!(site.method, "locate");
    }

    #[test]
    fn test_entry_defaults() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let entry = LogEntry::new(Severity::Info, "boot", at);
        assert_eq!(entry.user, DEFAULT_USER);
        assert_eq!(entry.permission, 0);
        assert!(entry.call_site.is_none());

        let entry = entry.with_user("alice", 3);
        assert_eq!(entry.user, "alice");
        assert_eq!(entry.permission, 3);
    }
}
