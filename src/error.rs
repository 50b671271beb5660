use std::{io, net::SocketAddrV4, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input error: {0}")]
    Args(String),

    #[error("Could not open filter file {}: {source}", .path.display())]
    FilterFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Socket {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Could not get translation: empty response from {0}")]
    EmptyResponse(SocketAddrV4),
}

impl Error {
    pub(crate) fn socket(context: &'static str) -> impl FnOnce(io::Error) -> Error {
        move |source| Error::Socket { context, source }
    }

    /// Process exit status: 1 for bad arguments, 2 for an unreadable filter file, 3 for
    /// anything that goes wrong on the wire.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Args(_) => 1,
            Error::FilterFile { .. } => 2,
            Error::Socket { .. } | Error::EmptyResponse(_) => 3,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn exit_codes_follow_error_kind() {
        let io = || io::Error::new(io::ErrorKind::Other, "boom");

        assert_eq!(Error::Args("missing -s".into()).exit_code(), 1);
        assert_eq!(
            Error::FilterFile {
                path: "blocked.txt".into(),
                source: io()
            }
            .exit_code(),
            2
        );
        assert_eq!(Error::socket("Binding listening socket")(io()).exit_code(), 3);
        assert_eq!(
            Error::EmptyResponse(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 53)).exit_code(),
            3
        );
    }

    #[test]
    fn socket_error_names_context() {
        let error = Error::socket("Sending to upstream")(io::Error::new(
            io::ErrorKind::Other,
            "network unreachable",
        ));

        assert_eq!(error.to_string(), "Sending to upstream: network unreachable");
    }
}
