use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use intake_core::UploadTarget;

/// Description of one file in a reservation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor<'a> {
    pub name: &'a str,
    pub size: u64,
    #[serde(rename = "type")]
    pub media_type: &'a str,
    pub content_disposition: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ReservationRequest<'a> {
    pub files: Vec<FileDescriptor<'a>>,
}

#[derive(Debug, Deserialize)]
pub struct ReservationResponse {
    pub data: Vec<PresignedUpload>,
}

/// One presigned destination, as returned by the storage service.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub url: String,
    pub fields: Map<String, Value>,
    pub file_url: String,
}

impl From<PresignedUpload> for UploadTarget {
    fn from(upload: PresignedUpload) -> Self {
        let fields = upload
            .fields
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect::<BTreeMap<_, _>>();

        UploadTarget {
            url: upload.url,
            fields,
            file_url: upload.file_url,
        }
    }
}
