mod support;

use std::time::Duration;

use support::{Backend, UsersReply, credential};
use yariga_auth::{
    Error, FileStorage, SessionManager, SessionStatus, SessionStorage, UserId,
};

fn manager_for(
    config: yariga_auth::ClientConfig,
    dir: &tempfile::TempDir,
) -> SessionManager<FileStorage> {
    SessionManager::from_config(config.with_session_file(dir.path().join("session.json"))).unwrap()
}

#[tokio::test]
async fn login_registers_user_and_persists_session() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_for(backend.spawn().await, &dir);
    let credential = credential("Ada", "ada@example.com");

    let outcome = manager.login(&credential).await.unwrap();

    assert_eq!(outcome.redirect_to, "/");
    let sent = backend.registrations.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "avatar": "https://img.example.com/Ada.png",
        })]
    );

    let storage = manager.store().storage();
    assert_eq!(storage.get("token").await.unwrap(), Some(credential));
    let user: serde_json::Value =
        serde_json::from_str(&storage.get("user").await.unwrap().unwrap()).unwrap();
    assert_eq!(user["userid"], "u1");
    assert_eq!(user["avatar"], "https://img.example.com/Ada.png");

    let profile = manager.get_identity().await.unwrap().unwrap();
    assert_eq!(profile.userid, Some(UserId::from("u1".to_string())));
    assert!(manager.check_session().await.is_authenticated());
}

#[tokio::test]
async fn non_200_registration_fails_without_persisting() {
    for status in [201, 400, 500] {
        let backend = Backend::new(UsersReply::Status(status));
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_for(backend.spawn().await, &dir);

        let err = manager
            .login(&credential("Ada", "ada@example.com"))
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::RegistrationRejected { status: s, .. } if s == status),
            "status {status}: {err}"
        );
        assert!(!dir.path().join("session.json").exists());
        assert!(!manager.check_session().await.is_authenticated());
    }
}

#[tokio::test]
async fn malformed_credential_never_reaches_backend() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_for(backend.spawn().await, &dir);

    let err = manager.login("not-a-credential").await.unwrap_err();

    assert!(matches!(err, Error::CredentialDecode(_)));
    assert!(backend.registrations.lock().unwrap().is_empty());
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn hung_registration_times_out() {
    let backend = Backend::new(UsersReply::Hang(Duration::from_secs(5)));
    let dir = tempfile::tempdir().unwrap();
    let config = backend
        .spawn()
        .await
        .with_request_timeout(Duration::from_millis(200));
    let manager = manager_for(config, &dir);

    let err = manager
        .login(&credential("Ada", "ada@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }), "unexpected error: {err}");
    assert!(!manager.check_session().await.is_authenticated());
}

#[tokio::test]
async fn requests_carry_current_token_until_logout() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_for(backend.spawn().await, &dir);
    let api = manager.api_client().unwrap();

    api.get("properties").await.unwrap();

    let credential = credential("Ada", "ada@example.com");
    manager.login(&credential).await.unwrap();
    api.get("properties").await.unwrap();
    api.get("/properties").await.unwrap();

    let outcome = manager.logout().await;
    assert_eq!(outcome.redirect_to, "/login");
    api.get("properties").await.unwrap();

    let bearer = Some(format!("Bearer {credential}"));
    assert_eq!(
        backend.authorizations(),
        vec![None, bearer.clone(), bearer, None]
    );
}

#[tokio::test]
async fn logout_revokes_token_in_background() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    let manager = manager_for(backend.spawn().await, &dir);
    let credential = credential("Ada", "ada@example.com");
    manager.login(&credential).await.unwrap();

    manager.logout().await;

    match manager.check_session().await {
        SessionStatus::Unauthenticated { redirect_to, logout, .. } => {
            assert_eq!(redirect_to, "/login");
            assert!(logout);
        }
        SessionStatus::Authenticated => panic!("session survived logout"),
    }
    assert_eq!(backend.wait_for_revocation().await, vec![credential]);
}

#[tokio::test]
async fn logout_succeeds_when_revocation_endpoint_is_down() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    let config = backend
        .spawn()
        .await
        .with_revoke_url("http://127.0.0.1:9/revoke".parse().unwrap());
    let manager = manager_for(config, &dir);
    manager.login(&credential("Ada", "ada@example.com")).await.unwrap();

    let outcome = manager.logout().await;

    assert_eq!(outcome.redirect_to, "/login");
    assert!(!manager.check_session().await.is_authenticated());
}

#[tokio::test]
async fn session_survives_restart() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    let config = backend.spawn().await;

    let first = manager_for(config.clone(), &dir);
    first.login(&credential("Ada", "ada@example.com")).await.unwrap();
    drop(first);

    let second = manager_for(config, &dir);
    assert!(second.check_session().await.is_authenticated());
    let profile = second.get_identity().await.unwrap().unwrap();
    assert_eq!(profile.email, "ada@example.com");
}

#[tokio::test]
async fn login_recovers_from_corrupt_session_file() {
    let backend = Backend::new(UsersReply::Ok("u1"));
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("session.json"), b"{truncated")
        .await
        .unwrap();
    let manager = manager_for(backend.spawn().await, &dir);

    assert!(!manager.check_session().await.is_authenticated());

    manager
        .login(&credential("Ada", "ada@example.com"))
        .await
        .unwrap();

    assert!(matches!(
        manager.check_session().await,
        SessionStatus::Authenticated
    ));
    assert!(manager.get_identity().await.unwrap().is_some());
}
