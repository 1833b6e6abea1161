/// Shell that will interpret a built command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `sh -c`
    Posix,
    /// `cmd /C`
    Windows,
}

impl ShellFlavor {
    /// Flavor of the shell `ExecutionService` spawns on this platform
    pub fn current() -> Self {
        if cfg!(windows) {
            ShellFlavor::Windows
        } else {
            ShellFlavor::Posix
        }
    }

    pub fn escape(&self, arg: &str) -> String {
        match self {
            ShellFlavor::Posix => escape_posix(arg),
            ShellFlavor::Windows => escape_windows(arg),
        }
    }

    /// Escape each argument and join with spaces
    pub fn join_args(&self, args: &[impl AsRef<str>]) -> String {
        args.iter()
            .map(|arg| self.escape(arg.as_ref()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

const POSIX_SPECIAL: &[char] = &[
    ' ', '\t', '\n', '\r', '\'', '"', '\\', '$', '`', ';', '&', '|', '<', '>', '(', ')', '*', '?',
    '[', ']', '{', '}', '~', '#', '!',
];

/// Single-quote `s` for a POSIX shell when it contains anything the shell
/// would interpret. Converts: foo'bar -> 'foo'\''bar'
///
/// # Examples
///
/// ```
/// use specpilot::command::shell::escape_posix;
///
/// assert_eq!(escape_posix("hello"), "hello");
/// assert_eq!(escape_posix("hello world"), "'hello world'");
/// assert_eq!(escape_posix("foo'bar"), "'foo'\\''bar'");
/// ```
pub fn escape_posix(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if !s.contains(POSIX_SPECIAL) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Double-quote `s` for `cmd.exe` when it contains whitespace, a quote or
/// a newline. Embedded quotes are doubled.
pub fn escape_windows(s: &str) -> String {
    if s.is_empty() {
        return "\"\"".to_string();
    }
    if !s.contains(|c: char| c.is_whitespace() || c == '"') {
        return s.to_string();
    }
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_plain_arguments_untouched() {
        assert_eq!(escape_posix("hello"), "hello");
        assert_eq!(escape_posix("src/main.rs"), "src/main.rs");
        assert_eq!(escape_posix("a-b_c.d:e,f"), "a-b_c.d:e,f");
    }

    #[test]
    fn test_posix_with_spaces() {
        assert_eq!(escape_posix("hello world"), "'hello world'");
    }

    #[test]
    fn test_posix_with_single_quote() {
        assert_eq!(escape_posix("foo'bar"), "'foo'\\''bar'");
    }

    #[test]
    fn test_posix_with_special_chars() {
        assert_eq!(escape_posix("$(whoami)"), "'$(whoami)'");
        assert_eq!(escape_posix("a\\b"), "'a\\b'");
        assert_eq!(escape_posix("line1\nline2"), "'line1\nline2'");
    }

    #[test]
    fn test_posix_empty() {
        assert_eq!(escape_posix(""), "''");
    }

    #[test]
    fn test_windows_escaping() {
        assert_eq!(escape_windows("plain"), "plain");
        assert_eq!(escape_windows("two words"), "\"two words\"");
        assert_eq!(escape_windows("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_windows("a\nb"), "\"a\nb\"");
        assert_eq!(escape_windows(""), "\"\"");
    }

    #[test]
    fn test_join_args_injection_protection() {
        let args = vec!["rm", "$(rm -rf /)"];
        assert_eq!(ShellFlavor::Posix.join_args(&args), "rm '$(rm -rf /)'");
    }

    #[test]
    fn test_current_matches_platform() {
        #[cfg(unix)]
        assert_eq!(ShellFlavor::current(), ShellFlavor::Posix);
        #[cfg(windows)]
        assert_eq!(ShellFlavor::current(), ShellFlavor::Windows);
    }
}
