//! API Integration Tests
//!
//! The server runs in-process with an in-memory ledger and a scripted
//! invite listing. The PostgreSQL test additionally requires DATABASE_URL.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use std::sync::Arc;

use integration_tests::{
    assert_json, assert_status, check_database_env, fixtures::*, TestServer,
};
use reqwest::StatusCode;
use tracker_core::{DomainEvent, FetchError, Snowflake, VanitySnapshot};

/// Observe the current listing, as an invite event would
async fn refresh(server: &TestServer, community: Snowflake) {
    let response = server
        .post_empty(&server.community_path(community, "/events/invite-create"))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

async fn join(server: &TestServer, community: Snowflake, user: Snowflake) -> JoinBody {
    let response = server
        .post(
            &server.community_path(community, "/events/member-join"),
            &JoinRequest::new(user),
        )
        .await
        .unwrap();
    let body: Envelope<JoinBody> = assert_json(response, StatusCode::OK).await.unwrap();
    body.data
}

async fn stats(server: &TestServer, community: Snowflake, user: Snowflake) -> StatsBody {
    let response = server
        .get(&server.community_path(community, &format!("/stats/{user}")))
        .await
        .unwrap();
    let body: Envelope<StatsBody> = assert_json(response, StatusCode::OK).await.unwrap();
    body.data
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready_without_backends() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"], "not_configured");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// Attribution Tests
// ============================================================================

#[tokio::test]
async fn test_join_through_counted_invite() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("abc", 3, inviter)]);
    refresh(&server, community).await;

    server.fetcher.set_invites(community, vec![invite("abc", 4, inviter)]);
    let joined = join(&server, community, user).await;

    assert_eq!(joined.user_id, user.to_string());
    assert_eq!(joined.attribution.kind, "normal");
    assert_eq!(joined.attribution.code.as_deref(), Some("abc"));
    assert_eq!(joined.attribution.inviter_id, Some(inviter.to_string()));
    assert!(!joined.attribution.ambiguous);
    assert!(!joined.fake);

    let counters = stats(&server, community, inviter).await;
    assert_eq!(counters.regular, 1);
    assert_eq!(counters.total, 1);
}

#[tokio::test]
async fn test_single_use_invite_that_vanished() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server
        .fetcher
        .set_invites(community, vec![invite("once", 0, inviter).with_max_uses(1)]);
    refresh(&server, community).await;

    server.fetcher.set_invites(community, Vec::new());
    let joined = join(&server, community, user).await;

    assert_eq!(joined.attribution.kind, "normal");
    assert_eq!(joined.attribution.code.as_deref(), Some("once"));
    assert_eq!(stats(&server, community, inviter).await.regular, 1);
}

#[tokio::test]
async fn test_vanity_join() {
    let server = TestServer::start().await.unwrap();
    let (community, user) = (unique_id(), unique_id());

    server
        .fetcher
        .set_vanity(community, Some(VanitySnapshot::new("cool", 10)));
    refresh(&server, community).await;

    server
        .fetcher
        .set_vanity(community, Some(VanitySnapshot::new("cool", 11)));
    let joined = join(&server, community, user).await;

    assert_eq!(joined.attribution.kind, "vanity");
    assert_eq!(joined.attribution.code.as_deref(), Some("cool"));
    assert!(joined.attribution.inviter_id.is_none());

    let response = server
        .get(&server.community_path(community, "/leaderboard"))
        .await
        .unwrap();
    let board: Envelope<LeaderboardBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(board.data.entries.is_empty());
}

#[tokio::test]
async fn test_join_without_evidence_is_unknown() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("abc", 2, inviter)]);
    refresh(&server, community).await;

    let joined = join(&server, community, user).await;
    assert_eq!(joined.attribution.kind, "unknown");
    assert_eq!(joined.attribution.reason.as_deref(), Some("no_candidate"));
    assert_eq!(stats(&server, community, inviter).await.total, 0);
}

#[tokio::test]
async fn test_young_account_is_fake() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("abc", 0, inviter)]);
    refresh(&server, community).await;
    server.fetcher.set_invites(community, vec![invite("abc", 1, inviter)]);

    let now = chrono::Utc::now();
    let response = server
        .post(
            &server.community_path(community, "/events/member-join"),
            &serde_json::json!({
                "user_id": user.to_string(),
                "account_created_at": now - chrono::Duration::days(1),
                "joined_at": now,
            }),
        )
        .await
        .unwrap();
    let joined: Envelope<JoinBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(joined.data.fake);

    let counters = stats(&server, community, inviter).await;
    assert_eq!(counters.regular, 1);
    assert_eq!(counters.fake, 1);
    assert_eq!(counters.total, 0);
}

#[tokio::test]
async fn test_concurrent_joins_in_one_community_are_serialized() {
    let server = Arc::new(TestServer::start().await.unwrap());
    let (community, inviter) = (unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("abc", 0, inviter)]);
    refresh(&server, community).await;
    server.fetcher.set_invites(community, vec![invite("abc", 2, inviter)]);

    let (a, b) = tokio::join!(
        join(&server, community, unique_id()),
        join(&server, community, unique_id()),
    );

    // The first join consumes the whole diff; the second sees nothing new
    let mut kinds = vec![a.attribution.kind, b.attribution.kind];
    kinds.sort();
    assert_eq!(kinds, vec!["normal".to_string(), "unknown".to_string()]);
    assert_eq!(stats(&server, community, inviter).await.regular, 1);
}

// ============================================================================
// Leave Tests
// ============================================================================

#[tokio::test]
async fn test_leave_reverses_credit() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("abc", 0, inviter)]);
    refresh(&server, community).await;
    server.fetcher.set_invites(community, vec![invite("abc", 1, inviter)]);
    join(&server, community, user).await;

    let response = server
        .post(
            &server.community_path(community, "/events/member-leave"),
            &LeaveRequest::new(user),
        )
        .await
        .unwrap();
    let left: Envelope<LeaveBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(left.data.closed);

    let counters = stats(&server, community, inviter).await;
    assert_eq!(counters.regular, 1);
    assert_eq!(counters.leaves, 1);
    assert_eq!(counters.total, 0);

    // Leaving twice changes nothing
    let response = server
        .post(
            &server.community_path(community, "/events/member-leave"),
            &LeaveRequest::new(user),
        )
        .await
        .unwrap();
    let left: Envelope<LeaveBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!left.data.closed);
    assert_eq!(stats(&server, community, inviter).await.leaves, 1);
}

#[tokio::test]
async fn test_inviter_lookup() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("abc", 0, inviter)]);
    refresh(&server, community).await;
    server.fetcher.set_invites(community, vec![invite("abc", 1, inviter)]);
    join(&server, community, user).await;

    let response = server
        .get(&server.community_path(community, &format!("/members/{user}/inviter")))
        .await
        .unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["data"]["record"]["inviter_id"], inviter.to_string());
    assert_eq!(body["data"]["record"]["code"], "abc");

    let response = server
        .get(&server.community_path(community, &format!("/stats/{inviter}/invited")))
        .await
        .unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

// ============================================================================
// Degraded Tracking Tests
// ============================================================================

#[tokio::test]
async fn test_permission_denied_disables_then_recovers() {
    let server = TestServer::start().await.unwrap();
    let (community, user) = (unique_id(), unique_id());
    let tracking_path = server.community_path(community, "/tracking");

    server.fetcher.fail(community, FetchError::PermissionDenied);
    let joined = join(&server, community, user).await;
    assert_eq!(joined.attribution.kind, "unknown");
    assert_eq!(joined.attribution.reason.as_deref(), Some("tracking_disabled"));

    let response = server.get(&tracking_path).await.unwrap();
    let tracking: Envelope<TrackingBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(tracking.data.status, "disabled");

    server.fetcher.recover(community);
    refresh(&server, community).await;

    let response = server.get(&tracking_path).await.unwrap();
    let tracking: Envelope<TrackingBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(tracking.data.status, "active");
    assert_eq!(tracking.data.cached_invites, Some(0));
}

#[tokio::test]
async fn test_fetch_failure_records_unknown() {
    let server = TestServer::start().await.unwrap();
    let (community, user) = (unique_id(), unique_id());

    server
        .fetcher
        .fail(community, FetchError::unavailable("502 from upstream"));
    let joined = join(&server, community, user).await;
    assert_eq!(joined.attribution.kind, "unknown");
    assert_eq!(joined.attribution.reason.as_deref(), Some("fetch_failed"));
}

// ============================================================================
// Admin Tests
// ============================================================================

#[tokio::test]
async fn test_bonus_and_reset() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter) = (unique_id(), unique_id());
    let bonus_path = server.community_path(community, &format!("/stats/{inviter}/bonus"));

    let response = server.post(&bonus_path, &BonusRequest { delta: 5 }).await.unwrap();
    let body: Envelope<StatsBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body.data.bonus, 5);
    assert_eq!(body.data.total, 5);

    let response = server.post(&bonus_path, &BonusRequest { delta: -2 }).await.unwrap();
    let body: Envelope<StatsBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body.data.bonus, 3);

    let response = server
        .delete(&server.community_path(community, &format!("/stats/{inviter}")))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats(&server, community, inviter).await.total, 0);
}

#[tokio::test]
async fn test_zero_bonus_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter) = (unique_id(), unique_id());

    let response = server
        .post(
            &server.community_path(community, &format!("/stats/{inviter}/bonus")),
            &BonusRequest { delta: 0 },
        )
        .await
        .unwrap();
    let body: ErrorEnvelope = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_reset_all_requires_confirmation() {
    let server = TestServer::start().await.unwrap();
    let (community, a, b) = (unique_id(), unique_id(), unique_id());

    for inviter in [a, b] {
        let response = server
            .post(
                &server.community_path(community, &format!("/stats/{inviter}/bonus")),
                &BonusRequest { delta: 1 },
            )
            .await
            .unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }

    let response = server
        .delete(&server.community_path(community, "/stats"))
        .await
        .unwrap();
    let body: ErrorEnvelope = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert!(body.error.message.contains("confirm"));

    let response = server
        .delete(&server.community_path(community, "/stats?confirm=true"))
        .await
        .unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["data"]["rows"], 2);
    assert_eq!(stats(&server, community, a).await.total, 0);
}

#[tokio::test]
async fn test_leaderboard_order() {
    let server = TestServer::start().await.unwrap();
    let (community, low, high) = (unique_id(), unique_id(), unique_id());

    for (inviter, delta) in [(low, 2), (high, 9)] {
        let response = server
            .post(
                &server.community_path(community, &format!("/stats/{inviter}/bonus")),
                &BonusRequest { delta },
            )
            .await
            .unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }

    let response = server
        .get(&server.community_path(community, "/leaderboard?limit=1"))
        .await
        .unwrap();
    let board: Envelope<LeaderboardBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(board.data.entries.len(), 1);
    assert_eq!(board.data.entries[0].rank, 1);
    assert_eq!(board.data.entries[0].inviter_id, high.to_string());
    assert_eq!(board.data.entries[0].total, 9);
}

#[tokio::test]
async fn test_evict_community() {
    let server = TestServer::start().await.unwrap();
    let community = unique_id();

    refresh(&server, community).await;
    let response = server
        .delete(&server.community_path(community, ""))
        .await
        .unwrap();
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["data"]["evicted"], true);
}

// ============================================================================
// Event Tests
// ============================================================================

#[tokio::test]
async fn test_join_emits_event() {
    let server = TestServer::start().await.unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());
    let mut events = server.events.subscribe();

    server.fetcher.set_invites(community, vec![invite("abc", 0, inviter)]);
    refresh(&server, community).await;
    server.fetcher.set_invites(community, vec![invite("abc", 1, inviter)]);
    join(&server, community, user).await;

    let event = events.recv().await.unwrap();
    match event {
        DomainEvent::JoinAttributed(e) => {
            assert_eq!(e.community_id, community);
            assert_eq!(e.user_id, user);
            assert_eq!(e.inviter_id, Some(inviter));
        }
        other => panic!("unexpected event {}", other.event_type()),
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_community_id() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .get("/api/v1/communities/not-a-number/leaderboard")
        .await
        .unwrap();
    let body: ErrorEnvelope = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.code, "INVALID_PATH_PARAMETER");
}

#[tokio::test]
async fn test_malformed_join_body() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .post(
            &server.community_path(unique_id(), "/events/member-join"),
            &serde_json::json!({ "user": 1 }),
        )
        .await
        .unwrap();
    let body: ErrorEnvelope = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.code, "INVALID_BODY");
}

// ============================================================================
// PostgreSQL Ledger
// ============================================================================

#[tokio::test]
async fn test_join_and_leave_against_postgres() {
    if !check_database_env() {
        return;
    }

    let url = std::env::var("DATABASE_URL").unwrap();
    let pool = tracker_db::create_pool(&tracker_db::DatabaseConfig::new(url, 5, 1))
        .await
        .expect("Failed to connect");
    tracker_db::run_migrations(&pool).await.expect("Failed to migrate");

    let server = TestServer::start_with_ledger(Arc::new(tracker_db::PgLedgerRepository::new(pool)))
        .await
        .unwrap();
    let (community, inviter, user) = (unique_id(), unique_id(), unique_id());

    server.fetcher.set_invites(community, vec![invite("pg", 0, inviter)]);
    refresh(&server, community).await;
    server.fetcher.set_invites(community, vec![invite("pg", 1, inviter)]);
    join(&server, community, user).await;

    let response = server
        .post(
            &server.community_path(community, "/events/member-leave"),
            &LeaveRequest::new(user),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let counters = stats(&server, community, inviter).await;
    assert_eq!(counters.regular, 1);
    assert_eq!(counters.leaves, 1);
}
