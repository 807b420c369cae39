use reqwest::multipart::Form;

use crate::api::{ApiClient, Blob, RequestOptions, Upload};
use crate::errors::ApiError;
use crate::models::photo::PhotoEnhanceParams;

pub struct PhotosApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PhotosApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST /photos/enhance, returning the processed image.
    /// Consumes a free use; 402 when none are left.
    pub async fn enhance(&self, file: &Upload, params: &PhotoEnhanceParams) -> Result<Blob, ApiError> {
        let form = Form::new()
            .part("file", file.to_part()?)
            .text("background", params.background.as_str())
            .text("brightness", params.brightness.to_string())
            .text("contrast", params.contrast.to_string())
            .text("sharpness", params.sharpness.to_string());

        self.client
            .request_bytes(
                "/photos/enhance",
                RequestOptions::multipart(form),
                "Enhancement failed",
            )
            .await
    }
}
