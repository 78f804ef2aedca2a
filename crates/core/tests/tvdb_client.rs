use reeltag_core::external_catalog::{TvdbClient, TvdbConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_with_login() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "session-token" }
        })))
        .mount(&server)
        .await;
    server
}

fn client(server: &MockServer, language: &str) -> TvdbClient {
    TvdbClient::new(
        TvdbConfig {
            api_key: "tvdb-key".to_string(),
            pin: None,
            base_url: Some(server.uri()),
        },
        language,
    )
    .unwrap()
}

fn episode_page(name: &str, overview: &str) -> serde_json::Value {
    json!({
        "data": {
            "episodes": [{
                "id": 438905,
                "name": name,
                "overview": overview,
                "aired": "2009-04-05",
                "seasonNumber": 2,
                "number": 5
            }]
        }
    })
}

#[tokio::test]
async fn test_episode_requested_in_configured_language() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/series/81189/episodes/default/deu"))
        .and(query_param("season", "2"))
        .and(query_param("episodeNumber", "5"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(episode_page("Schwund", "Walt und Jesse machen Geschäfte.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let episode = client(&server, "de").get_episode(81189, 2, 5).await.unwrap();
    assert_eq!(episode.name.as_deref(), Some("Schwund"));
    assert_eq!(
        episode.overview.as_deref(),
        Some("Walt und Jesse machen Geschäfte.")
    );
}

#[tokio::test]
async fn test_episode_falls_back_to_default_language() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/series/81189/episodes/default/ita"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/series/81189/episodes/default"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(episode_page("Breakage", "Walt deals.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let episode = client(&server, "it").get_episode(81189, 2, 5).await.unwrap();
    assert_eq!(episode.name.as_deref(), Some("Breakage"));
}

#[tokio::test]
async fn test_series_text_translated() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/series/81189/extended"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 81189,
                "name": "Breaking Bad",
                "year": "2008",
                "overview": "A chemistry teacher turns to crime.",
                "originalNetwork": { "name": "AMC" },
                "genres": [{ "name": "Drama" }]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/series/81189/translations/fra"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "name": "Breaking Bad",
                "overview": "Un professeur de chimie devient criminel.",
                "language": "fra"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = client(&server, "fr").get_series(81189).await.unwrap();
    assert_eq!(series.name, "Breaking Bad");
    assert_eq!(
        series.overview.as_deref(),
        Some("Un professeur de chimie devient criminel.")
    );
    assert_eq!(series.network.as_deref(), Some("AMC"));
}

#[tokio::test]
async fn test_missing_series_translation_keeps_default_text() {
    let server = server_with_login().await;
    Mock::given(method("GET"))
        .and(path("/series/81189/extended"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": 81189,
                "name": "Breaking Bad",
                "overview": "A chemistry teacher turns to crime."
            }
        })))
        .mount(&server)
        .await;

    let series = client(&server, "ja").get_series(81189).await.unwrap();
    assert_eq!(
        series.overview.as_deref(),
        Some("A chemistry teacher turns to crime.")
    );
}
