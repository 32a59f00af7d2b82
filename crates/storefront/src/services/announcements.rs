//! Site announcements the shopper has not dismissed.

use std::collections::BTreeSet;

use tower_sessions::Session;

use crate::api::Announcement;
use crate::models::session_keys;
use crate::state::AppState;

async fn closed(session: &Session) -> BTreeSet<String> {
    session
        .get::<BTreeSet<String>>(session_keys::CLOSED_ANNOUNCEMENTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Active announcements minus dismissed ones. Fetch failures hide the bar.
pub async fn visible(state: &AppState, session: &Session) -> Vec<Announcement> {
    let all = match state.api().announcements().await {
        Ok(all) => all,
        Err(e) => {
            tracing::warn!("Failed to fetch announcements: {e}");
            return Vec::new();
        }
    };
    let closed = closed(session).await;
    all.iter()
        .filter(|a| !closed.contains(&a.id))
        .cloned()
        .collect()
}

/// Remember that the shopper closed an announcement.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn dismiss(session: &Session, id: &str) -> Result<(), tower_sessions::session::Error> {
    let mut closed = closed(session).await;
    if closed.insert(id.to_string()) {
        session
            .insert(session_keys::CLOSED_ANNOUNCEMENTS, closed)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_dismiss_is_remembered() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        dismiss(&session, "a1").await.unwrap();
        dismiss(&session, "a1").await.unwrap();
        dismiss(&session, "a2").await.unwrap();

        let closed = closed(&session).await;
        assert_eq!(closed.len(), 2);
        assert!(closed.contains("a1"));
    }
}
