//! Core types for exposer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::Error;

/// HTTP verbs an exposed function can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Method::Get => 1,
            Method::Post => 1 << 1,
            Method::Put => 1 << 2,
            Method::Delete => 1 << 3,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::Config(format!("unsupported HTTP method: {}", other))),
        }
    }
}

/// Set of permitted methods for one binding. May be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodSet(u8);

impl MethodSet {
    pub const EMPTY: MethodSet = MethodSet(0);
    pub const GET: MethodSet = MethodSet(1);
    pub const POST: MethodSet = MethodSet(1 << 1);
    pub const PUT: MethodSet = MethodSet(1 << 2);
    pub const DELETE: MethodSet = MethodSet(1 << 3);
    pub const ALL: MethodSet = MethodSet(0b1111);

    pub fn with(self, method: Method) -> Self {
        MethodSet(self.0 | method.bit())
    }

    pub fn contains(&self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        Method::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        iter.into_iter().fold(MethodSet::EMPTY, MethodSet::with)
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        MethodSet::EMPTY.with(method)
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|m| m.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// How the request body turns into the function's argument.
///
/// `Literal` decodes twice: the body must be a JSON string whose contents are
/// JSON again (`"42"` yields `42`). `Single` uses the decoded body as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    #[default]
    Literal,
    Single,
}

/// Liveness of a background listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerState {
    /// Thread spawned, socket not bound yet
    Starting,
    /// Accepting connections
    Listening { addr: SocketAddr },
    /// Shut down after cancellation
    Stopped,
    /// Bind, runtime or serve failure
    Failed { reason: String },
}

impl ListenerState {
    /// True once the listener can no longer serve requests
    pub fn is_terminal(&self) -> bool {
        matches!(self, ListenerState::Stopped | ListenerState::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_set_membership() {
        let set: MethodSet = [Method::Get, Method::Put].into_iter().collect();

        assert!(set.contains(Method::Get));
        assert!(set.contains(Method::Put));
        assert!(!set.contains(Method::Post));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "[GET, PUT]");
    }

    #[test]
    fn test_method_set_constants() {
        assert_eq!(MethodSet::ALL.len(), 4);
        assert!(MethodSet::EMPTY.is_empty());
        assert_eq!(MethodSet::from(Method::Delete), MethodSet::DELETE);
        assert_eq!(
            MethodSet::GET.with(Method::Post).with(Method::Put).with(Method::Delete),
            MethodSet::ALL
        );
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
        assert!("PATCH".parse::<Method>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ListenerState::Starting.is_terminal());
        assert!(ListenerState::Stopped.is_terminal());
        assert!(ListenerState::Failed { reason: "boom".into() }.is_terminal());
    }
}
