use crate::capture::CapturedImage;
use crate::plate::Plate;
use async_trait::async_trait;
use failure::Error;
use log::{debug, warn};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

/// Model instruction. The response contract is the whole protocol: either a
/// bare plate string or the NOT_FOUND sentinel, nothing else.
const PROMPT: &str = "Analyze the image and extract the car license plate number. \
Respond with only the license plate string in the Brazilian formats 'ABC1234' or 'ABC1D23'. \
If you cannot find a clear license plate, respond with the exact string 'NOT_FOUND'.";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/";
const MODEL: &str = "gemini-2.5-flash";

/// Anything that can turn a camera frame into plate text.
#[async_trait]
pub trait PlateReader: Send + Sync {
    /// Raw model output for the frame, trimmed and uppercased. The NOT_FOUND
    /// sentinel passes through untouched.
    async fn raw_plate_text(&self, image: &CapturedImage) -> Result<String, Error>;

    /// Raw output put through plate validation; `None` means no usable plate
    /// was in the frame, which is not an error.
    async fn read_plate(&self, image: &CapturedImage) -> Result<Option<Plate>, Error> {
        let text = self.raw_plate_text(image).await?;
        Ok(Plate::from_model_response(&text))
    }
}

/// Client for the hosted Gemini generateContent endpoint. One request per
/// frame, no retries, no streaming; timeouts are whatever reqwest defaults to.
pub struct GeminiReader {
    client: Client,
    base: Url,
    api_key: String,
}

impl GeminiReader {
    pub fn new(api_key: String) -> GeminiReader {
        let base = Url::parse(DEFAULT_API_BASE).expect("default API base must parse");
        GeminiReader::with_base(api_key, base)
    }

    /// Points the reader at a different API base, e.g. a mock server.
    pub fn with_base(api_key: String, base: Url) -> GeminiReader {
        GeminiReader {
            client: Client::new(),
            base,
            api_key,
        }
    }

    fn endpoint(&self) -> Result<Url, Error> {
        let path = format!("v1beta/models/{}:generateContent", MODEL);
        Ok(self.base.join(&path)?)
    }
}

#[async_trait]
impl PlateReader for GeminiReader {
    async fn raw_plate_text(&self, image: &CapturedImage) -> Result<String, Error> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": image.mime_type(), "data": image.base64_data() } },
                    { "text": PROMPT },
                ]
            }]
        });

        let response = self
            .client
            .post(self.endpoint()?)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Model endpoint returned {}: {}", status, detail.trim());
            return Err(format_err!("model endpoint returned status {}", status));
        }

        let reply: Value = response.json().await?;
        let text = reply["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| format_err!("model response is missing a text part"))?;
        debug!("Model answered {:?}", text);
        Ok(text.trim().to_ascii_uppercase())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Reader with a canned response, for session and handler tests.
    pub struct StubReader {
        response: Result<String, ()>,
    }

    impl StubReader {
        pub fn answering(text: &str) -> StubReader {
            StubReader {
                response: Ok(text.to_string()),
            }
        }

        pub fn failing() -> StubReader {
            StubReader { response: Err(()) }
        }
    }

    #[async_trait]
    impl PlateReader for StubReader {
        async fn raw_plate_text(&self, _image: &CapturedImage) -> Result<String, Error> {
            match &self.response {
                Ok(text) => Ok(text.trim().to_ascii_uppercase()),
                Err(()) => Err(format_err!("stubbed transport failure")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::test_data_url;
    use httpmock::prelude::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Runtime::new().unwrap().block_on(future)
    }

    fn reader_for(server: &MockServer) -> GeminiReader {
        let base = Url::parse(&server.url("/")).unwrap();
        GeminiReader::with_base("test-key".to_string(), base)
    }

    fn frame() -> CapturedImage {
        CapturedImage::from_data_url(&test_data_url(64, 32)).unwrap()
    }

    fn model_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    }

    #[test]
    fn recognizes_a_plate_from_the_model_answer() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.5-flash:generateContent")
                .query_param("key", "test-key");
            then.status(200).json_body(model_reply(" abc1234 \n"));
        });

        let reader = reader_for(&server);
        let plate = block_on(reader.read_plate(&frame())).unwrap();
        mock.assert();
        assert_eq!(plate, Plate::from_model_response("ABC1234"));
    }

    #[test]
    fn sentinel_answer_means_no_plate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).query_param("key", "test-key");
            then.status(200).json_body(model_reply("NOT_FOUND"));
        });

        let reader = reader_for(&server);
        let plate = block_on(reader.read_plate(&frame())).unwrap();
        assert_eq!(plate, None);
    }

    #[test]
    fn prose_answer_means_no_plate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).query_param("key", "test-key");
            then.status(200)
                .json_body(model_reply("I see a blue car but no readable plate"));
        });

        let reader = reader_for(&server);
        let plate = block_on(reader.read_plate(&frame())).unwrap();
        assert_eq!(plate, None);
    }

    #[test]
    fn raw_text_passes_the_sentinel_through() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).query_param("key", "test-key");
            then.status(200).json_body(model_reply("NOT_FOUND"));
        });

        let reader = reader_for(&server);
        let text = block_on(reader.raw_plate_text(&frame())).unwrap();
        assert_eq!(text, "NOT_FOUND");
    }

    #[test]
    fn server_error_is_an_error_not_an_absence() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).query_param("key", "test-key");
            then.status(503).body("upstream overloaded");
        });

        let reader = reader_for(&server);
        assert!(block_on(reader.read_plate(&frame())).is_err());
    }

    #[test]
    fn answer_without_a_text_part_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).query_param("key", "test-key");
            then.status(200).json_body(json!({ "candidates": [] }));
        });

        let reader = reader_for(&server);
        assert!(block_on(reader.raw_plate_text(&frame())).is_err());
    }
}
