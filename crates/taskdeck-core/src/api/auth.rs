use reqwest::Method;
use reqwest::multipart::{Form, Part};

use super::{ApiClient, ApiError, AuthApi};
use crate::models::{
    AuthResponse, Credentials, ProfileResponse, Registration, RegistrationBody, User,
};

/// Multipart field carrying the profile image.
const PROFILE_IMAGE_FIELD: &str = "profileImage";

impl AuthApi for ApiClient {
    async fn profile(&self) -> Result<User, ApiError> {
        let response: ProfileResponse = self.get_json(self.endpoint("profile")).await?;
        Ok(response.user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let credentials = Credentials { email, password };
        self.send_json(Method::POST, self.endpoint("login"), &credentials).await
    }

    async fn register(&self, data: &Registration) -> Result<AuthResponse, ApiError> {
        match &data.profile_image {
            None => {
                let body = RegistrationBody::from(data);
                self.send_json(Method::POST, self.endpoint("register"), &body).await
            }
            Some(_) => {
                let form = registration_form(data)?;
                self.send_multipart(self.endpoint("register"), form).await
            }
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.send_empty(Method::POST, self.endpoint("logout")).await
    }
}

fn registration_form(data: &Registration) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("names", data.names.clone())
        .text("lastnames", data.lastnames.clone())
        .text("age", data.age.to_string())
        .text("email", data.email.clone())
        .text("password", data.password.clone());

    if let Some(image) = &data.profile_image {
        let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(mime) = image.mime_type.as_deref()
            && !mime.trim().is_empty()
        {
            part = part
                .mime_str(mime)
                .map_err(|err| ApiError::InvalidInput(format!("profile image type: {err}")))?;
        }
        form = form.part(PROFILE_IMAGE_FIELD, part);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::SessionCookies;
    use crate::models::ProfileImage;

    fn user_json() -> serde_json::Value {
        json!({ "id": "u1", "names": "Ada", "lastnames": "Lovelace", "email": "ada@example.com" })
    }

    fn registration(image: Option<ProfileImage>) -> Registration {
        Registration {
            names: "Ada".to_string(),
            lastnames: "Lovelace".to_string(),
            age: 36,
            email: "ada@example.com".to_string(),
            password: "engine42".to_string(),
            profile_image: image,
        }
    }

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(
            &format!("{}/api", server.uri()),
            None,
            Arc::new(SessionCookies::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_posts_credentials_and_keeps_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(json!({ "email": "ada@example.com", "password": "engine42" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "token=s3cr3t; Path=/; HttpOnly")
                    .set_body_json(json!({ "message": "Login successful", "user": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .and(header("cookie", "token=s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": user_json() })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let response = client.login("ada@example.com", "engine42").await.unwrap();
        assert_eq!(response.user.names, "Ada");
        assert_eq!(response.message.as_deref(), Some("Login successful"));

        let profile = client.profile().await.unwrap();
        assert_eq!(profile.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_register_without_image_sends_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .and(body_json(json!({
                "names": "Ada",
                "lastnames": "Lovelace",
                "age": 36,
                "email": "ada@example.com",
                "password": "engine42"
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "message": "ok", "user": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.register(&registration(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_register_with_image_sends_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .and(header_exists("content-type"))
            .and(body_string_contains("name=\"profileImage\"; filename=\"ada.gif\""))
            .and(body_string_contains("name=\"age\""))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "message": "ok", "user": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let image = ProfileImage::from_bytes("ada.gif", b"GIF89a\x01\x00\x01\x00".to_vec());
        assert_eq!(image.mime_type.as_deref(), Some("image/gif"));
        let client = client_for(&server).await;
        client.register(&registration(Some(image))).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_profile_unauthorized_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.profile().await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_logout_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_string("bye"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.logout().await.unwrap();
    }
}
