// End-to-end lifecycle: login, request authentication, refresh, device
// management, logout-everywhere, and the background sweep.

use campus_sessions::models::UserRole;
use campus_sessions::session::{
    ManualClock, MemorySessionStorage, SessionConfig, SessionManager,
};
use chrono::{Duration, Utc};
use std::sync::Arc;

const SECRET: &[u8] = b"integration-test-secret";

fn build_manager(config: SessionConfig) -> (Arc<SessionManager>, Arc<ManualClock>) {
    // Anchored to the real current time so signed access tokens stay fresh
    // while the manual clock drives session expiry.
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let storage = Arc::new(MemorySessionStorage::new(config.max_sessions_per_user));
    let manager = Arc::new(SessionManager::new(
        storage,
        clock.clone(),
        SECRET,
        config,
    ));
    (manager, clock)
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let (manager, clock) = build_manager(SessionConfig::default());

    // Login issues a pair that immediately authenticates.
    let pair = manager
        .create_session(
            "student-42",
            "s42@campus.edu",
            UserRole::Student,
            Some("Chrome on Windows"),
            Some("10.0.0.7"),
        )
        .await
        .unwrap();

    let info = manager
        .validate_access_token(&pair.access_token)
        .await
        .expect("fresh access token should authenticate");
    assert_eq!(info.user_id, "student-42");
    assert_eq!(info.role, UserRole::Student);

    // A second device logs in; the account now shows both sessions, most
    // recently active first.
    clock.advance(Duration::minutes(3));
    let phone = manager
        .create_session(
            "student-42",
            "s42@campus.edu",
            UserRole::Student,
            Some("Safari on iPhone"),
            Some("10.0.0.9"),
        )
        .await
        .unwrap();

    let sessions = manager.get_user_sessions("student-42").await;
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].device_info.as_deref(), Some("Safari on iPhone"));

    // The refresh endpoint re-signs the access token and hands back the
    // same refresh token.
    clock.advance(Duration::minutes(10));
    let refreshed = manager
        .refresh_session(&pair.refresh_token)
        .await
        .expect("live session should refresh");
    assert_eq!(refreshed.refresh_token, pair.refresh_token);
    assert_ne!(refreshed.access_token, pair.access_token);

    // "Revoke this device" from the session management screen.
    let listed = manager.get_user_sessions("student-42").await;
    let phone_session = listed
        .iter()
        .find(|s| s.device_info.as_deref() == Some("Safari on iPhone"))
        .unwrap();
    assert!(manager.destroy_session(phone_session.session_id).await);
    assert!(manager.refresh_session(&phone.refresh_token).await.is_none());

    // Password change: log out everywhere.
    assert_eq!(manager.destroy_all_user_sessions("student-42").await, 1);
    assert!(manager.validate_access_token(&refreshed.access_token).await.is_none());
    assert!(manager.get_user_sessions("student-42").await.is_empty());
}

#[tokio::test]
async fn test_session_cap_across_devices() {
    let (manager, clock) = build_manager(SessionConfig {
        max_sessions_per_user: 5,
        ..SessionConfig::default()
    });

    let mut pairs = Vec::new();
    for i in 0..5 {
        pairs.push(
            manager
                .create_session(
                    "student-42",
                    "s42@campus.edu",
                    UserRole::Student,
                    Some(&format!("device-{}", i)),
                    None,
                )
                .await
                .unwrap(),
        );
        clock.advance(Duration::minutes(1));
    }
    assert_eq!(manager.get_user_sessions("student-42").await.len(), 5);

    // A sixth login: the cap holds and the oldest session is dropped while
    // everyone else keeps their seat.
    manager
        .create_session(
            "student-42",
            "s42@campus.edu",
            UserRole::Student,
            Some("device-5"),
            None,
        )
        .await
        .unwrap();

    let sessions = manager.get_user_sessions("student-42").await;
    assert_eq!(sessions.len(), 5);
    assert!(manager.refresh_session(&pairs[0].refresh_token).await.is_none());
    for pair in &pairs[1..] {
        assert!(manager.refresh_session(&pair.refresh_token).await.is_some());
    }

    // Another user is unaffected by all of this.
    manager
        .create_session("instructor-7", "i7@campus.edu", UserRole::Instructor, None, None)
        .await
        .unwrap();
    assert_eq!(manager.get_user_sessions("instructor-7").await.len(), 1);
}

#[tokio::test]
async fn test_background_sweep_reclaims_expired_sessions() {
    let (manager, clock) = build_manager(SessionConfig {
        cleanup_interval_secs: 1,
        ..SessionConfig::default()
    });

    manager
        .create_session("student-42", "s42@campus.edu", UserRole::Student, None, None)
        .await
        .unwrap();
    manager
        .create_session("instructor-7", "i7@campus.edu", UserRole::Instructor, None, None)
        .await
        .unwrap();

    manager.start();

    // Nothing is expired yet; the sweeper must leave both alone.
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    assert_eq!(manager.get_stats().await.total_sessions, 2);

    // Past the absolute lifetime the backlog shows up in stats, and the
    // next cycle reclaims it.
    clock.advance(Duration::seconds(
        SessionConfig::default().refresh_token_ttl_secs + 1,
    ));
    assert_eq!(manager.get_stats().await.expired_sessions, 2);

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    let stats = manager.get_stats().await;
    assert_eq!(stats.total_sessions, 0);
    assert_eq!(stats.active_users, 0);

    manager.shutdown();
}
