use url::Url;

use crate::error::ClientError;

/// How a session reaches its room: create a new room by name, or join an
/// existing one by id. Validated before any connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomTarget {
    Create { room_name: String },
    Join { room_id: String },
}

impl RoomTarget {
    /// Target for the create flow. A blank (empty or whitespace-only)
    /// name is rejected locally.
    pub fn create(room_name: &str) -> Result<Self, ClientError> {
        if room_name.trim().is_empty() {
            return Err(ClientError::EmptyRoomName);
        }
        Ok(Self::Create {
            room_name: room_name.to_owned(),
        })
    }

    /// Target for the join flow. A missing or empty room id fails here,
    /// straight to the not-found outcome.
    pub fn join(room_id: Option<&str>) -> Result<Self, ClientError> {
        match room_id {
            Some(id) if !id.is_empty() => Ok(Self::Join {
                room_id: id.to_owned(),
            }),
            _ => Err(ClientError::TargetMissing),
        }
    }

    /// Connection endpoint for this target under `base`
    /// (e.g. `ws://localhost:3000`).
    pub fn endpoint(&self, base: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(base)?;
        match self {
            Self::Create { room_name } => {
                url.set_path("/api/create_room");
                url.query_pairs_mut().append_pair("room_name", room_name);
            }
            Self::Join { room_id } => {
                url.set_path("/api/join_room");
                url.query_pairs_mut().append_pair("room_id", room_id);
            }
        }
        Ok(url)
    }
}
