use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use job_board::config::{AuthConfig, ReviewValidation, WorkflowConfig};
use job_board::http::api_router;
use job_board::store::seed::{
    seed_demo, SeedPasswords, EMPLOYER_PASSWORD, EMPLOYER_USERNAME, STUDENT_PASSWORD,
    STUDENT_USERNAME,
};
use job_board::store::SqliteStore;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Api {
    router: Router,
}

impl Api {
    fn new(review_validation: ReviewValidation) -> Self {
        let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
        let router = api_router(
            store,
            WorkflowConfig { review_validation },
            AuthConfig { bcrypt_cost: 4 },
        );
        Self { router }
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, payload)
    }

    async fn register(&self, username: &str, role: &str, extra: Value) -> String {
        let mut body = json!({
            "username": username,
            "email": format!("{username}@test.edu"),
            "password": format!("{username}-secret"),
            "role": role,
            "first_name": "Test",
            "last_name": "User",
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        let (status, payload) = self.call("POST", "/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "register {username}: {payload}");
        payload["token"]
            .as_str()
            .expect("token issued")
            .to_string()
    }

    /// Store preloaded with the demo users, skills, categories, and two vacancies.
    fn seeded() -> Self {
        let store = SqliteStore::in_memory().expect("in-memory store");
        let passwords = SeedPasswords {
            student_hash: bcrypt::hash(STUDENT_PASSWORD, 4).expect("hash"),
            employer_hash: bcrypt::hash(EMPLOYER_PASSWORD, 4).expect("hash"),
        };
        seed_demo(&store, &passwords).expect("demo data");
        let router = api_router(
            Arc::new(store),
            WorkflowConfig::default(),
            AuthConfig { bcrypt_cost: 4 },
        );
        Self { router }
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, payload) = self
            .call(
                "POST",
                "/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {username}: {payload}");
        payload["token"]
            .as_str()
            .expect("token issued")
            .to_string()
    }

    async fn employer(&self) -> String {
        self.employer_named("employer_test").await
    }

    async fn employer_named(&self, username: &str) -> String {
        self.register(
            username,
            "employer",
            json!({
                "company_name": "IT Department",
                "department": "Development",
                "contact_person": "Anna Sidorova",
                "phone": "+79997654321"
            }),
        )
        .await
    }

    async fn student(&self, username: &str) -> String {
        self.register(username, "student", json!({ "faculty": "Informatics", "course": 3 }))
            .await
    }

    async fn vacancy(&self, token: &str, title: &str, is_active: bool) -> i64 {
        let (status, payload) = self
            .call(
                "POST",
                "/vacancies",
                Some(token),
                Some(json!({
                    "title": title,
                    "description": "Help maintain internal services",
                    "requirements": "Python",
                    "vacancy_type": "internship",
                    "salary": 25000,
                    "location": "Main building, room 305",
                    "is_active": is_active
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create vacancy: {payload}");
        payload["id"].as_i64().expect("vacancy id")
    }

    async fn apply(&self, token: &str, vacancy: i64, body: Value) -> (StatusCode, Value) {
        self.call(
            "POST",
            &format!("/vacancies/{vacancy}/apply"),
            Some(token),
            Some(body),
        )
        .await
    }
}

fn valid_application() -> Value {
    json!({
        "resume_url": "https://r",
        "cover_letter": "ten-plus chars"
    })
}

#[tokio::test]
async fn apply_review_and_notify_scenario() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Python developer assistant", true).await;

    let (status, application) = api.apply(&student, vacancy, valid_application()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["status"], "pending");
    let id = application["id"].as_i64().expect("application id");

    let (status, updated) = api
        .call(
            "PATCH",
            &format!("/applications/{id}/update-status"),
            Some(&employer),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "accepted");

    let (status, notifications) = api
        .call("GET", "/notifications", Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let notifications = notifications.as_array().expect("notification list");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["notification_type"], "application_update");

    let review_uri = format!("/applications/{id}/add-review");
    let (status, reviewed) = api
        .call(
            "POST",
            &review_uri,
            Some(&employer),
            Some(json!({ "rating": 5, "comment": "Excellent" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reviewed["rating"], 5);
    assert_eq!(reviewed["comment"], "Excellent");

    let (status, rejected) = api
        .call(
            "POST",
            &review_uri,
            Some(&employer),
            Some(json!({ "rating": 1, "comment": "Changed my mind" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected["error"], true);
    assert_eq!(rejected["code"], 400);

    let (_, stored) = api
        .call("GET", &format!("/applications/{id}"), Some(&student), None)
        .await;
    assert_eq!(stored["review"]["rating"], 5);
    assert_eq!(stored["review"]["comment"], "Excellent");

    let (_, count) = api
        .call("GET", "/notifications/unread_count", Some(&student), None)
        .await;
    assert_eq!(count["count"], 2);
}

#[tokio::test]
async fn second_application_is_rejected_without_a_new_row() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Lab assistant", true).await;

    let (status, _) = api.apply(&student, vacancy, valid_application()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = api.apply(&student, vacancy, valid_application()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = api
        .call("GET", "/applications", Some(&student), None)
        .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn inactive_vacancy_is_hidden_from_everyone_but_its_owner() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Closed posting", false).await;
    let uri = format!("/vacancies/{vacancy}");

    let (status, _) = api.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = api.call("GET", &uri, Some(&student), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = api.call("GET", &uri, Some(&employer), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = api.apply(&student, vacancy, valid_application()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, public) = api.call("GET", "/vacancies", None, None).await;
    assert_eq!(public.as_array().map(Vec::len), Some(0));
    let (_, own) = api
        .call("GET", "/vacancies?show_all=true", Some(&employer), None)
        .await;
    assert_eq!(own.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn apply_validates_resume_scheme_and_cover_letter_length() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Lab assistant", true).await;

    let (status, payload) = api
        .apply(
            &student,
            vacancy,
            json!({ "resume_url": "ftp://x", "cover_letter": "a perfectly long cover letter" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(payload["detail"]["resume_url"].is_array());

    let (status, payload) = api
        .apply(
            &student,
            vacancy,
            json!({ "resume_url": "https://r", "cover_letter": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(payload["detail"]["cover_letter"].is_array());

    let (_, listed) = api
        .call("GET", "/applications", Some(&student), None)
        .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn invalid_status_keeps_the_previous_value() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Lab assistant", true).await;
    let (_, application) = api.apply(&student, vacancy, valid_application()).await;
    let id = application["id"].as_i64().expect("application id");

    for value in ["hired", " accepted "] {
        let (status, payload) = api
            .call(
                "PATCH",
                &format!("/applications/{id}/update-status"),
                Some(&employer),
                Some(json!({ "status": value })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{value:?}");
        assert!(payload["detail"]["status"].is_array());
    }

    let (_, stored) = api
        .call("GET", &format!("/applications/{id}"), Some(&employer), None)
        .await;
    assert_eq!(stored["status"], "pending");
}

#[tokio::test]
async fn students_cannot_change_status_or_review() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Lab assistant", true).await;
    let (_, application) = api.apply(&student, vacancy, valid_application()).await;
    let id = application["id"].as_i64().expect("application id");

    let (status, _) = api
        .call(
            "PATCH",
            &format!("/applications/{id}/update-status"),
            Some(&student),
            Some(json!({ "status": "accepted" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api
        .call(
            "POST",
            &format!("/applications/{id}/add-review"),
            Some(&student),
            Some(json!({ "rating": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Eager validation rejects in the workflow with a range message; deferred
/// validation relies on the store's CHECK constraint. The messages differ but
/// both are 400 and neither writes a review or a notification.
#[tokio::test]
async fn rating_range_is_enforced_in_both_validation_modes() {
    let mut messages = Vec::new();
    for mode in [ReviewValidation::Eager, ReviewValidation::Deferred] {
        let api = Api::new(mode);
        let employer = api.employer().await;
        let student = api.student("student_test").await;
        let vacancy = api.vacancy(&employer, "Lab assistant", true).await;
        let (_, application) = api.apply(&student, vacancy, valid_application()).await;
        let id = application["id"].as_i64().expect("application id");

        let (status, payload) = api
            .call(
                "POST",
                &format!("/applications/{id}/add-review"),
                Some(&employer),
                Some(json!({ "rating": 7 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{mode:?}");
        messages.push(payload["detail"]["rating"][0].clone());

        let (_, stored) = api
            .call("GET", &format!("/applications/{id}"), Some(&student), None)
            .await;
        assert!(stored["review"].is_null(), "{mode:?} stored a review");
        let (_, count) = api
            .call("GET", "/notifications/unread_count", Some(&student), None)
            .await;
        assert_eq!(count["count"], 0, "{mode:?} left a notification");
    }

    assert_ne!(
        messages[0], messages[1],
        "eager and deferred validation report the range violation differently"
    );
}

#[tokio::test]
async fn register_login_and_me_round_out_the_session() {
    let api = Api::new(ReviewValidation::Eager);
    let token = api.student("ivan").await;

    let (status, login) = api
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "ivan", "password": "ivan-secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token"], token.as_str());
    assert_eq!(login["role"], "student");

    let (status, _) = api
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "ivan", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = api.call("GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "ivan");
    assert_eq!(me["role"], "student");
    assert_eq!(me["student_profile"]["course"], 3);

    let (status, _) = api.call("GET", "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, duplicate) = api
        .call(
            "POST",
            "/register",
            None,
            Some(json!({ "username": "ivan", "email": "other@test.edu", "password": "x1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate["code"], 400);
}

#[tokio::test]
async fn unknown_token_is_rejected_even_on_public_routes() {
    let api = Api::new(ReviewValidation::Eager);

    let (status, payload) = api
        .call("GET", "/vacancies", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["error"], true);
    assert_eq!(payload["code"], 401);
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let api = Api::new(ReviewValidation::Eager);
    let (status, payload) = api.call("GET", "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["code"], 404);
}

fn titles(payload: &Value) -> Vec<String> {
    let mut titles: Vec<String> = payload
        .as_array()
        .expect("vacancy list")
        .iter()
        .filter_map(|vacancy| vacancy["title"].as_str().map(str::to_string))
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn replace_keeps_stored_visibility_and_salary_when_omitted() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let vacancy = api.vacancy(&employer, "Closed posting", false).await;
    let uri = format!("/vacancies/{vacancy}");

    let (status, replaced) = api
        .call(
            "PUT",
            &uri,
            Some(&employer),
            Some(json!({
                "title": "Closed posting, revised",
                "description": "Help maintain internal services",
                "requirements": "Python, SQL",
                "vacancy_type": "work",
                "location": "Building 2"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{replaced}");
    assert_eq!(replaced["title"], "Closed posting, revised");
    assert_eq!(replaced["vacancy_type"], "work");
    assert_eq!(replaced["is_active"], false);
    assert_eq!(replaced["salary"], 25000.0);

    let (status, _) = api.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, payload) = api
        .call(
            "PUT",
            &uri,
            Some(&employer),
            Some(json!({ "title": "Only a title" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["description", "requirements", "vacancy_type", "location"] {
        assert!(payload["detail"][field].is_array(), "missing error for {field}");
    }
}

#[tokio::test]
async fn only_the_owning_employer_may_change_a_vacancy() {
    let api = Api::new(ReviewValidation::Eager);
    let owner = api.employer().await;
    let rival = api.employer_named("rival_employer").await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&owner, "Lab assistant", true).await;
    let uri = format!("/vacancies/{vacancy}");

    let (status, _) = api
        .call("PATCH", &uri, Some(&rival), Some(json!({ "title": "Taken over" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = api
        .call(
            "PUT",
            &uri,
            Some(&rival),
            Some(json!({
                "title": "Taken over",
                "description": "x",
                "requirements": "x",
                "vacancy_type": "work",
                "location": "x"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = api.call("DELETE", &uri, Some(&rival), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, payload) = api
        .call(
            "POST",
            "/vacancies",
            Some(&student),
            Some(json!({
                "title": "Student posting",
                "description": "x",
                "requirements": "x",
                "vacancy_type": "work",
                "location": "x"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], 403);

    let (status, stored) = api.call("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["title"], "Lab assistant");
}

#[tokio::test]
async fn employer_in_the_body_is_ignored_on_create() {
    let api = Api::new(ReviewValidation::Eager);
    let owner = api.employer().await;
    let rival = api.employer_named("rival_employer").await;
    let (_, me) = api.call("GET", "/me", Some(&owner), None).await;
    let (_, rival_me) = api.call("GET", "/me", Some(&rival), None).await;

    let (status, created) = api
        .call(
            "POST",
            "/vacancies",
            Some(&owner),
            Some(json!({
                "title": "Lab assistant",
                "description": "Help with experiments",
                "requirements": "Chemistry",
                "vacancy_type": "work",
                "location": "Lab 4",
                "employer": rival_me["id"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["employer"]["id"], me["id"]);
    assert_ne!(created["employer"]["id"], rival_me["id"]);
}

#[tokio::test]
async fn deleting_a_vacancy_removes_its_applications() {
    let api = Api::new(ReviewValidation::Eager);
    let employer = api.employer().await;
    let student = api.student("student_test").await;
    let vacancy = api.vacancy(&employer, "Lab assistant", true).await;
    let (_, application) = api.apply(&student, vacancy, valid_application()).await;
    let id = application["id"].as_i64().expect("application id");

    let (status, _) = api
        .call("DELETE", &format!("/vacancies/{vacancy}"), Some(&employer), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = api
        .call("GET", "/applications", Some(&student), None)
        .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
    let (status, _) = api
        .call("GET", &format!("/applications/{id}"), Some(&student), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_narrow_by_type_category_search_and_owner() {
    let api = Api::seeded();
    let (_, categories) = api.call("GET", "/categories", None, None).await;
    let research = categories
        .as_array()
        .expect("category list")
        .iter()
        .find(|category| category["slug"] == "research")
        .and_then(|category| category["id"].as_i64())
        .expect("research category");

    let (_, all) = api.call("GET", "/vacancies", None, None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (_, work) = api.call("GET", "/vacancies?type=work", None, None).await;
    assert_eq!(titles(&work), ["Web development teaching assistant"]);

    let (_, in_research) = api
        .call("GET", &format!("/vacancies?category={research}"), None, None)
        .await;
    assert_eq!(titles(&in_research), ["Python developer assistant"]);

    let (_, searched) = api.call("GET", "/vacancies?search=python", None, None).await;
    assert_eq!(titles(&searched), ["Python developer assistant"]);

    let (_, combined) = api
        .call("GET", "/vacancies?type=work&search=python", None, None)
        .await;
    assert_eq!(combined.as_array().map(Vec::len), Some(0));

    let rival = api.employer_named("rival_employer").await;
    api.vacancy(&rival, "Python tutor", true).await;
    api.vacancy(&rival, "Hidden draft", false).await;

    let (_, mine) = api.call("GET", "/vacancies?my=1", Some(&rival), None).await;
    assert_eq!(titles(&mine), ["Hidden draft", "Python tutor"]);

    let (_, seeded_owner) = api
        .call(
            "GET",
            "/vacancies?my=true",
            Some(&api.login(EMPLOYER_USERNAME, EMPLOYER_PASSWORD).await),
            None,
        )
        .await;
    assert_eq!(seeded_owner.as_array().map(Vec::len), Some(2));

    let (_, anonymous_my) = api.call("GET", "/vacancies?my=1", None, None).await;
    assert_eq!(anonymous_my.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn update_profile_replaces_student_skills() {
    let api = Api::seeded();
    let student = api.login(STUDENT_USERNAME, STUDENT_PASSWORD).await;
    let (_, skills) = api.call("GET", "/skills", None, None).await;
    let skill_id = |name: &str| {
        skills
            .as_array()
            .expect("skill list")
            .iter()
            .find(|skill| skill["name"] == name)
            .and_then(|skill| skill["id"].as_i64())
            .expect("seeded skill")
    };

    let (status, _) = api
        .call(
            "POST",
            "/update-profile",
            Some(&student),
            Some(json!({ "skills": [skill_id("Python"), skill_id("Django")] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, mine) = api
        .call("GET", "/student-profiles/my_skills", Some(&student), None)
        .await;
    assert_eq!(mine.as_array().map(Vec::len), Some(2));

    let (status, _) = api
        .call(
            "POST",
            "/update-profile",
            Some(&student),
            Some(json!({ "skills": [skill_id("JavaScript")] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, mine) = api
        .call("GET", "/student-profiles/my_skills", Some(&student), None)
        .await;
    let names: Vec<&str> = mine
        .as_array()
        .expect("skill list")
        .iter()
        .filter_map(|skill| skill["name"].as_str())
        .collect();
    assert_eq!(names, ["JavaScript"]);
}

#[tokio::test]
async fn my_skills_is_forbidden_for_non_students() {
    let api = Api::seeded();
    let employer = api.login(EMPLOYER_USERNAME, EMPLOYER_PASSWORD).await;

    let (status, payload) = api
        .call("GET", "/student-profiles/my_skills", Some(&employer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(payload["code"], 403);

    let (status, _) = api
        .call("GET", "/student-profiles/my_skills", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
