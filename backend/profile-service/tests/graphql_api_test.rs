//! GraphQL and HTTP surface over the in-memory store

use std::sync::Arc;

use actix_web::{test, web, App};
use async_graphql::{Request, Variables};
use profile_service::build_state;
use profile_service::config::{AuthConfig, GraphQLConfig};
use profile_service::db::InMemoryProfileStore;
use profile_service::handlers::{configure, AppState};
use serde_json::{json, Value};
use uuid::Uuid;

fn state() -> AppState {
    let store = Arc::new(InMemoryProfileStore::new());
    build_state(
        store.clone(),
        store,
        AuthConfig::default(),
        GraphQLConfig::default(),
    )
}

async fn run(state: &AppState, query: &str, variables: Value) -> Value {
    let response = state
        .schema
        .execute(Request::new(query).variables(Variables::from_json(variables)))
        .await;
    serde_json::to_value(&response).unwrap()
}

const CREATE_INDIVIDUAL: &str = r#"
    mutation Create($input: CreateIndividualProfileInput!) {
        createIndividualProfile(input: $input) {
            success
            message
            profile {
                ... on IndividualProfileType { id firstName lastName fullName city profileType }
            }
        }
    }
"#;

const CREATE_BUSINESS: &str = r#"
    mutation Create($input: CreateBusinessProfileInput!) {
        createBusinessProfile(input: $input) {
            success
            message
            profile {
                ... on BusinessProfileType { id businessName verifications { status } }
            }
        }
    }
"#;

async fn create_individual(state: &AppState, external: Uuid, extra: Value) -> String {
    let mut input = json!({ "externalUserId": external.to_string() });
    if let (Some(target), Some(fields)) = (input.as_object_mut(), extra.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    let res = run(state, CREATE_INDIVIDUAL, json!({ "input": input })).await;
    assert_eq!(
        res["data"]["createIndividualProfile"]["success"], true,
        "{}",
        res
    );
    res["data"]["createIndividualProfile"]["profile"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[actix_web::test]
async fn test_health_and_banner() {
    let state = state();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &state))).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, web::Bytes::from_static(b"ok"));

    let req = test::TestRequest::get().uri("/").to_request();
    let banner: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(banner["graphql"], "/graphql");
    assert_eq!(banner["health"], "/health");
}

#[actix_web::test]
async fn test_graphql_requires_issued_credentials() {
    let state = state();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &state))).await;

    let req = test::TestRequest::post()
        .uri("/api-keys")
        .set_json(json!({ "service_name": "onboarding" }))
        .to_request();
    let issued: Value = test::call_and_read_body_json(&app, req).await;
    let client_id = issued["client_id"].as_str().unwrap().to_string();
    let secret = issued["secret_key"].as_str().unwrap().to_string();
    assert!(client_id.starts_with("cli_"));
    assert!(secret.starts_with("sk_"));
    assert_eq!(issued["service_name"], "onboarding");

    let query = json!({ "query": "{ profiles { totalCount hasNextPage } }" });

    let req = test::TestRequest::post()
        .uri("/graphql")
        .set_json(query.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(("X-API-Key", client_id.clone()))
        .insert_header(("X-API-Secret", "sk_wrong"))
        .set_json(query.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/graphql")
        .insert_header(("X-API-Key", client_id))
        .insert_header(("X-API-Secret", secret))
        .set_json(query)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["profiles"]["totalCount"], 0);
    assert_eq!(body["data"]["profiles"]["hasNextPage"], false);
}

#[actix_web::test]
async fn test_api_key_requires_service_name() {
    let state = state();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &state))).await;

    let req = test::TestRequest::post()
        .uri("/api-keys")
        .set_json(json!({ "service_name": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[actix_web::test]
async fn test_schema_sdl_and_playground_are_public() {
    let state = state();
    let app = test::init_service(App::new().configure(|cfg| configure(cfg, &state))).await;

    let req = test::TestRequest::get().uri("/graphql/schema").to_request();
    let body = test::call_and_read_body(&app, req).await;
    let sdl = String::from_utf8(body.to_vec()).unwrap();
    assert!(sdl.contains("union ProfileUnion"));

    let req = test::TestRequest::get().uri("/graphql").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_create_and_read_back_by_user() {
    let state = state();
    let external = Uuid::new_v4();
    create_individual(
        &state,
        external,
        json!({ "firstName": "Ana", "lastName": "Li", "gender": "FEMALE" }),
    )
    .await;

    let res = run(
        &state,
        r#"
        query ByUser($user: ID!) {
            profileByUser(externalUserId: $user) {
                __typename
                ... on IndividualProfileType {
                    firstName lastName fullName gender profileType
                    verifications { status reviewedAt }
                }
            }
        }
        "#,
        json!({ "user": external.to_string() }),
    )
    .await;

    let profile = &res["data"]["profileByUser"];
    assert_eq!(profile["__typename"], "IndividualProfileType");
    assert_eq!(profile["firstName"], "Ana");
    assert_eq!(profile["fullName"], "Ana Li");
    assert_eq!(profile["gender"], "FEMALE");
    assert_eq!(profile["profileType"], "INDIVIDUAL");
    assert_eq!(profile["verifications"].as_array().unwrap().len(), 1);
    assert_eq!(profile["verifications"][0]["status"], "PENDING");
    assert!(profile["verifications"][0]["reviewedAt"].is_null());
}

#[tokio::test]
async fn test_domain_failures_use_envelope() {
    let state = state();
    let external = Uuid::new_v4();
    create_individual(&state, external, json!({})).await;

    let res = run(
        &state,
        CREATE_INDIVIDUAL,
        json!({ "input": { "externalUserId": external.to_string() } }),
    )
    .await;
    assert!(res.get("errors").map_or(true, |e| e.as_array().map_or(true, |a| a.is_empty())));
    let payload = &res["data"]["createIndividualProfile"];
    assert_eq!(payload["success"], false);
    assert_eq!(payload["message"], "Profile already exists for this user");
    assert!(payload["profile"].is_null());

    let res = run(
        &state,
        CREATE_BUSINESS,
        json!({ "input": { "externalUserId": Uuid::new_v4().to_string() } }),
    )
    .await;
    let payload = &res["data"]["createBusinessProfile"];
    assert_eq!(payload["success"], false);
    assert_eq!(
        payload["message"],
        "Business name is required for business profiles"
    );
}

#[tokio::test]
async fn test_malformed_id_is_a_graphql_error() {
    let state = state();
    let res = run(
        &state,
        r#"mutation { deleteProfile(id: "not-a-uuid") { success message } }"#,
        json!({}),
    )
    .await;
    let errors = res["errors"].as_array().expect("errors expected");
    assert!(!errors.is_empty());
    assert!(errors[0]["message"].as_str().unwrap().contains("Invalid id"));
}

#[tokio::test]
async fn test_business_profile_starts_pending() {
    let state = state();
    let res = run(
        &state,
        CREATE_BUSINESS,
        json!({ "input": {
            "externalUserId": Uuid::new_v4().to_string(),
            "businessName": "Acme Ltd",
            "taxId": "TX-1"
        } }),
    )
    .await;
    let payload = &res["data"]["createBusinessProfile"];
    assert_eq!(payload["success"], true);
    assert_eq!(payload["profile"]["businessName"], "Acme Ltd");
    assert_eq!(payload["profile"]["verifications"][0]["status"], "PENDING");
}

#[tokio::test]
async fn test_update_distinguishes_null_from_omitted() {
    let state = state();
    let id = create_individual(
        &state,
        Uuid::new_v4(),
        json!({ "firstName": "Ana", "lastName": "Li", "city": "Lyon", "country": "France" }),
    )
    .await;

    let res = run(
        &state,
        r#"
        mutation Update($id: ID!, $input: UpdateIndividualProfileInput!) {
            updateIndividualProfile(id: $id, input: $input) {
                success
                profile {
                    ... on IndividualProfileType { firstName lastName city country }
                }
            }
        }
        "#,
        json!({ "id": id, "input": { "lastName": null, "city": "Paris" } }),
    )
    .await;

    let payload = &res["data"]["updateIndividualProfile"];
    assert_eq!(payload["success"], true, "{}", res);
    let profile = &payload["profile"];
    assert_eq!(profile["firstName"], "Ana");
    assert!(profile["lastName"].is_null());
    assert_eq!(profile["city"], "Paris");
    assert_eq!(profile["country"], "France");
}

#[tokio::test]
async fn test_update_of_other_kind_reports_not_found() {
    let state = state();
    let id = create_individual(&state, Uuid::new_v4(), json!({})).await;

    let res = run(
        &state,
        r#"
        mutation Update($id: ID!) {
            updateBusinessProfile(id: $id, input: { businessName: "Nope" }) {
                success message profile { __typename }
            }
        }
        "#,
        json!({ "id": id }),
    )
    .await;
    let payload = &res["data"]["updateBusinessProfile"];
    assert_eq!(payload["success"], false);
    assert_eq!(payload["message"], "Business profile not found");
}

#[tokio::test]
async fn test_verification_flow() {
    let state = state();
    let id = create_individual(&state, Uuid::new_v4(), json!({})).await;

    let res = run(
        &state,
        r#"
        mutation Verify($input: VerifyProfileInput!) {
            verifyProfile(input: $input) {
                success
                message
                verification { id status reviewedBy reviewedAt }
            }
        }
        "#,
        json!({ "input": { "profileId": id, "status": "APPROVED", "reviewedBy": "alice" } }),
    )
    .await;
    let verification = &res["data"]["verifyProfile"]["verification"];
    assert_eq!(res["data"]["verifyProfile"]["success"], true);
    assert_eq!(
        res["data"]["verifyProfile"]["message"],
        "Profile verification status set to APPROVED"
    );
    assert_eq!(verification["status"], "APPROVED");
    assert_eq!(verification["reviewedBy"], "alice");
    assert!(!verification["reviewedAt"].is_null());
    let verification_id = verification["id"].as_str().unwrap().to_string();

    let res = run(
        &state,
        r#"
        query Latest($id: ID!) {
            latestVerification(profileId: $id) { id status }
            profileVerifications(profileId: $id) { status }
            profiles(filter: { verificationStatus: APPROVED }) { totalCount }
        }
        "#,
        json!({ "id": id }),
    )
    .await;
    assert_eq!(res["data"]["latestVerification"]["id"], verification_id.as_str());
    assert_eq!(
        res["data"]["profileVerifications"].as_array().unwrap().len(),
        2
    );
    assert_eq!(res["data"]["profiles"]["totalCount"], 1);

    let res = run(
        &state,
        r#"
        mutation Review($input: UpdateVerificationInput!) {
            updateVerification(input: $input) {
                success
                verification { status reviewedBy notes }
            }
        }
        "#,
        json!({ "input": {
            "verificationId": verification_id,
            "status": "REJECTED",
            "notes": "expired passport"
        } }),
    )
    .await;
    let updated = &res["data"]["updateVerification"]["verification"];
    assert_eq!(updated["status"], "REJECTED");
    assert_eq!(updated["reviewedBy"], "alice");
    assert_eq!(updated["notes"], "expired passport");
}

#[tokio::test]
async fn test_document_mutations() {
    let state = state();
    let id = create_individual(&state, Uuid::new_v4(), json!({})).await;

    let res = run(
        &state,
        r#"
        mutation Upload($input: UploadDocumentInput!) {
            uploadProfileDocument(input: $input) {
                success document { id fileType verified }
            }
        }
        "#,
        json!({ "input": {
            "profileId": id,
            "fileType": "PASSPORT",
            "fileName": "passport.pdf",
            "url": "https://files.example.com/passport.pdf"
        } }),
    )
    .await;
    let document = &res["data"]["uploadProfileDocument"]["document"];
    assert_eq!(document["fileType"], "PASSPORT");
    assert_eq!(document["verified"], false);
    let document_id = document["id"].as_str().unwrap().to_string();

    let res = run(
        &state,
        r#"
        mutation Verify($id: ID!) {
            verifyDocument(input: { documentId: $id, verified: true }) {
                success message document { verified }
            }
        }
        "#,
        json!({ "id": document_id }),
    )
    .await;
    assert_eq!(res["data"]["verifyDocument"]["document"]["verified"], true);
    assert_eq!(
        res["data"]["verifyDocument"]["message"],
        "Document verified successfully"
    );

    let res = run(
        &state,
        r#"
        mutation Reject($id: ID!) {
            verifyDocument(input: { documentId: $id, verified: false }) {
                message document { verified }
            }
        }
        "#,
        json!({ "id": document_id }),
    )
    .await;
    assert_eq!(res["data"]["verifyDocument"]["document"]["verified"], false);
    assert_eq!(
        res["data"]["verifyDocument"]["message"],
        "Document rejected successfully"
    );

    let res = run(
        &state,
        r#"
        mutation Upload($input: UploadDocumentInput!) {
            uploadProfileDocument(input: $input) { success message }
        }
        "#,
        json!({ "input": {
            "profileId": Uuid::new_v4().to_string(),
            "fileType": "OTHER",
            "url": "https://files.example.com/x"
        } }),
    )
    .await;
    assert_eq!(res["data"]["uploadProfileDocument"]["success"], false);
    assert_eq!(
        res["data"]["uploadProfileDocument"]["message"],
        "Profile not found"
    );

    let res = run(
        &state,
        r#"
        mutation Delete($doc: ID!, $profile: ID!) {
            deleteDocument(id: $doc) { success }
            deleteProfile(id: $profile) { success message }
        }
        "#,
        json!({ "doc": document_id, "profile": id }),
    )
    .await;
    assert_eq!(res["data"]["deleteDocument"]["success"], true);
    assert_eq!(res["data"]["deleteProfile"]["success"], true);

    let res = run(
        &state,
        r#"query Docs($id: ID!) { profile(id: $id) { __typename } profileDocuments(profileId: $id) { id } }"#,
        json!({ "id": id }),
    )
    .await;
    assert!(res["data"]["profile"].is_null());
    assert_eq!(res["data"]["profileDocuments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_profiles_pagination() {
    let state = state();
    for _ in 0..3 {
        create_individual(&state, Uuid::new_v4(), json!({})).await;
    }

    let res = run(
        &state,
        r#"
        query Page($p: PaginationInput) {
            profiles(pagination: $p) {
                totalCount hasNextPage
                profiles { __typename }
            }
        }
        "#,
        json!({ "p": { "limit": 2 } }),
    )
    .await;
    let page = &res["data"]["profiles"];
    assert_eq!(page["totalCount"], 3);
    assert_eq!(page["hasNextPage"], true);
    assert_eq!(page["profiles"].as_array().unwrap().len(), 2);

    let res = run(
        &state,
        r#"{ profiles(pagination: { limit: 2, offset: 2 }) { hasNextPage profiles { __typename } } }"#,
        json!({}),
    )
    .await;
    assert_eq!(res["data"]["profiles"]["hasNextPage"], false);
    assert_eq!(
        res["data"]["profiles"]["profiles"].as_array().unwrap().len(),
        1
    );
}
