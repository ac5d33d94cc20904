//! Query roles under which tickets are harvested.

use std::fmt;
use std::str::FromStr;

/// The relationship between the authenticated agent and a harvested ticket.
///
/// Roles are harvested in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Tickets returned by the ticket listing endpoint.
    Assigned,
    /// Tickets the agent is CC'd on.
    Cc,
    /// Tickets the agent follows.
    Follower,
    /// Tickets the agent requested.
    Requester,
}

impl Role {
    /// All roles in harvest order.
    pub const ALL: [Role; 4] = [Role::Assigned, Role::Cc, Role::Follower, Role::Requester];

    /// Returns the tag stamped on records harvested under this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assigned => "assigned",
            Role::Cc => "cc",
            Role::Follower => "follower",
            Role::Requester => "requester",
        }
    }

    /// Returns the search query for roles served by the search endpoint.
    ///
    /// `Assigned` is served by the ticket listing endpoint and has no query.
    pub fn search_query(&self, user_id: u64) -> Option<String> {
        match self {
            Role::Assigned => None,
            role => Some(format!("type:ticket {}:{}", role.as_str(), user_id)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assigned" => Ok(Role::Assigned),
            "cc" => Ok(Role::Cc),
            "follower" => Ok(Role::Follower),
            "requester" => Ok(Role::Requester),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}
