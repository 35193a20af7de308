//! Image classification through a remote inference endpoint.

use super::{ImageClassifier, ModelError, Prediction};
use crate::conversation::ImageRef;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Posts the image as a multipart `file` upload and reads back the top-1 class.
pub struct RemoteClassifier {
    endpoint: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ClassifierResponse {
    #[serde(alias = "predicted_class")]
    label: String,
    confidence: f64,
}

impl RemoteClassifier {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

fn file_name_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "upload.png",
        _ => "upload.jpg",
    }
}

#[async_trait]
impl ImageClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote-classifier"
    }

    async fn classify(&self, image: &ImageRef) -> Result<Prediction, ModelError> {
        let part = Part::bytes(image.data().to_vec())
            .file_name(file_name_for(&image.media_type))
            .mime_str(&image.media_type)
            .map_err(|e| ModelError::Request(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ClassifierResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        if !(0.0..=1.0).contains(&body.confidence) {
            return Err(ModelError::InvalidResponse(format!(
                "confidence {} outside [0, 1]",
                body.confidence
            )));
        }

        Ok(Prediction {
            label: body.label,
            confidence: body.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_classify_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "filename": "upload.png",
                "predicted_class": "goldfish",
                "confidence": 0.9312
            })))
            .expect(1)
            .mount(&server)
            .await;

        let classifier = RemoteClassifier::new(&format!("{}/predict", server.uri()), 5);
        let image = ImageRef::new("image/png", vec![137u8, 80, 78, 71]);
        let prediction = classifier.classify(&image).await.unwrap();

        assert_eq!(prediction.label, "goldfish");
        assert!((prediction.confidence - 0.9312).abs() < f64::EPSILON);

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap();
        assert!(content_type
            .to_str()
            .unwrap()
            .starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_classify_accepts_label_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "label": "tabby",
                "confidence": 0.5
            })))
            .mount(&server)
            .await;

        let classifier = RemoteClassifier::new(&server.uri(), 5);
        let image = ImageRef::new("image/jpeg", vec![0xFFu8, 0xD8]);
        assert_eq!(classifier.classify(&image).await.unwrap().label, "tabby");
    }

    #[tokio::test]
    async fn test_classify_rejects_bad_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "label": "tabby",
                "confidence": 3.0
            })))
            .mount(&server)
            .await;

        let classifier = RemoteClassifier::new(&server.uri(), 5);
        let image = ImageRef::new("image/jpeg", vec![0xFFu8]);
        assert!(matches!(
            classifier.classify(&image).await,
            Err(ModelError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let classifier = RemoteClassifier::new(&server.uri(), 5);
        let image = ImageRef::new("image/jpeg", vec![0xFFu8]);
        assert!(matches!(
            classifier.classify(&image).await,
            Err(ModelError::Api { status: 500, .. })
        ));
    }
}
