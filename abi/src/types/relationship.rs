use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{Error, FromRow, Row};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, sqlx::Type)]
#[sqlx(type_name = "relationship_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => "pending",
            RelationshipStatus::Accepted => "accepted",
            RelationshipStatus::Rejected => "rejected",
        }
    }
}

impl Display for RelationshipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RelationshipStatus::Pending),
            "accepted" => Ok(RelationshipStatus::Accepted),
            "rejected" => Ok(RelationshipStatus::Rejected),
            other => Err(format!("Invalid relationship status: {other}")),
        }
    }
}

/// Friend request between two users; once accepted it is the friendship itself.
///
/// Created by the requester, but its meaning is symmetric: at most one record
/// exists for an unordered pair of users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub requester: String,
    pub recipient: String,
    pub status: RelationshipStatus,
    pub create_time: i64,
    pub update_time: i64,
}

impl Relationship {
    /// whether this record links `a` and `b`, in either ordering
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.requester == a && self.recipient == b) || (self.requester == b && self.recipient == a)
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.requester == user_id || self.recipient == user_id
    }

    /// the participant that is not `user_id`
    pub fn counterpart(&self, user_id: &str) -> &str {
        if self.requester == user_id {
            &self.recipient
        } else {
            &self.requester
        }
    }
}

impl FromRow<'_, PgRow> for Relationship {
    fn from_row(row: &'_ PgRow) -> Result<Self, Error> {
        Ok(Self {
            id: row.try_get("id")?,
            requester: row.try_get("requester")?,
            recipient: row.try_get("recipient")?,
            status: row.try_get("status")?,
            create_time: row.try_get("create_time")?,
            update_time: row.try_get("update_time")?,
        })
    }
}

/// How a viewer relates to another user, as shown on a profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipStanding {
    /// the viewer has a pending request out to the other user
    pub request_sent: bool,
    /// the pending request the other user sent to the viewer
    pub request_received: Option<Relationship>,
    pub friends: bool,
}

impl RelationshipStanding {
    pub fn from_relationship(viewer: &str, relationship: Option<Relationship>) -> Self {
        let Some(rel) = relationship else {
            return Self::default();
        };
        match rel.status {
            RelationshipStatus::Accepted => Self {
                friends: true,
                ..Default::default()
            },
            RelationshipStatus::Pending if rel.requester == viewer => Self {
                request_sent: true,
                ..Default::default()
            },
            RelationshipStatus::Pending => Self {
                request_received: Some(rel),
                ..Default::default()
            },
            RelationshipStatus::Rejected => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(status: RelationshipStatus) -> Relationship {
        Relationship {
            id: "r1".to_string(),
            requester: "alice".to_string(),
            recipient: "bob".to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn links_matches_both_orderings() {
        let r = rel(RelationshipStatus::Pending);
        assert!(r.links("alice", "bob"));
        assert!(r.links("bob", "alice"));
        assert!(!r.links("alice", "carol"));
        assert_eq!(r.counterpart("bob"), "alice");
        assert_eq!(r.counterpart("alice"), "bob");
    }

    #[test]
    fn status_text_round_trips() {
        for status in [
            RelationshipStatus::Pending,
            RelationshipStatus::Accepted,
            RelationshipStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<RelationshipStatus>(), Ok(status));
        }
        assert!("blocked".parse::<RelationshipStatus>().is_err());
    }

    #[test]
    fn standing_depends_on_viewer() {
        let pending = rel(RelationshipStatus::Pending);
        let sent = RelationshipStanding::from_relationship("alice", Some(pending.clone()));
        assert!(sent.request_sent);
        assert!(sent.request_received.is_none());

        let received = RelationshipStanding::from_relationship("bob", Some(pending.clone()));
        assert!(!received.request_sent);
        assert_eq!(received.request_received, Some(pending));

        let friends =
            RelationshipStanding::from_relationship("bob", Some(rel(RelationshipStatus::Accepted)));
        assert!(friends.friends);

        let rejected =
            RelationshipStanding::from_relationship("bob", Some(rel(RelationshipStatus::Rejected)));
        assert_eq!(rejected, RelationshipStanding::default());
        assert_eq!(
            RelationshipStanding::from_relationship("bob", None),
            RelationshipStanding::default()
        );
    }
}
