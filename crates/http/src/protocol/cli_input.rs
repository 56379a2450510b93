//! Command-line input.
//!
//! A command line is routed like a request: positional arguments become path segments
//! (`app users list` routes `/users/list`) and `--key=value` arguments become options.

use std::collections::HashMap;
use std::ffi::OsString;

use http::Method;

use crate::protocol::input::env_vars_lossy;
use crate::protocol::{Input, Params};

/// Input adapter for the command-line transport.
#[derive(Debug, Clone)]
pub struct CliInput {
    method: Method,
    path: String,
    args: Vec<String>,
    options: HashMap<String, String>,
    env: HashMap<String, String>,
    params: Params,
}

impl CliInput {
    /// Reads the process arguments (skipping the program name) and the process environment.
    pub fn from_env() -> Self {
        Self::from_os_args(std::env::args_os().skip(1)).with_vars(env_vars_lossy())
    }

    /// Like [`from_args`](CliInput::from_args); arguments that are not valid UTF-8 are
    /// converted lossily.
    pub fn from_os_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        Self::from_args(args.into_iter().map(|arg| arg.to_string_lossy().into_owned()))
    }

    /// Builds the input from arguments, not including the program name.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut positional = vec![];
        let mut options = HashMap::new();

        for arg in args.into_iter().map(Into::into) {
            match arg.strip_prefix("--") {
                Some(option) if !option.is_empty() => {
                    let (key, value) = option.split_once('=').unwrap_or((option, "true"));
                    options.insert(key.to_owned(), value.to_owned());
                }
                _ => positional.push(arg),
            }
        }

        let path = format!("/{}", positional.join("/"));
        Self { method: Method::GET, path, args: positional, options, env: HashMap::new(), params: Params::new() }
    }

    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Positional arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Value of a `--key=value` option; a bare `--flag` reads as `"true"`.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

impl Input for CliInput {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn root_uri(&self) -> &str {
        ""
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn set_params(&mut self, params: Params) {
        self.params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::CliInput;
    use crate::protocol::Input;

    #[test]
    fn test_positional_args_become_path() {
        let input = CliInput::from_args(["users", "list", "--limit=10", "--verbose"]);

        assert_eq!(input.path(), "/users/list");
        assert_eq!(input.args(), ["users", "list"]);
        assert_eq!(input.option("limit"), Some("10"));
        assert_eq!(input.option("verbose"), Some("true"));
        assert_eq!(input.option("missing"), None);
        assert!(input.is_get());
    }

    #[test]
    fn test_no_args_routes_root() {
        let input = CliInput::from_args(Vec::<String>::new());
        assert_eq!(input.path(), "/");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_args_are_converted_lossily() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let input = CliInput::from_os_args([OsString::from("files"), OsString::from_vec(b"caf\xff".to_vec())]);
        assert_eq!(input.path(), "/files/caf\u{fffd}");
    }

    #[test]
    fn test_env_lookup() {
        let input = CliInput::from_args(["run"]).with_vars([("OMNI_ENV", "production")]);
        assert_eq!(input.env("OMNI_ENV").as_deref(), Some("production"));
    }
}
