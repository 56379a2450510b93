/// The kind of front end a process was started by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// A CGI-style gateway: the request arrives through meta-variables and the response
    /// needs a `Status` field and headers.
    Http,
    /// A command line: the request is the argument list and the response is plain stdout.
    Cli,
}

impl Transport {
    /// Detects the transport from the process environment.
    ///
    /// Gateways always set `REQUEST_METHOD`; a shell never does.
    pub fn detect() -> Self {
        Self::from_request_method(std::env::var_os("REQUEST_METHOD").is_some())
    }

    fn from_request_method(has_request_method: bool) -> Self {
        if has_request_method { Transport::Http } else { Transport::Cli }
    }

    #[inline]
    pub fn is_cli(self) -> bool {
        self == Transport::Cli
    }
}
