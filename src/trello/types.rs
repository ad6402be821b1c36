use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCardRequest<'a> {
    pub name: &'a str,
    pub desc: &'a str,
    #[serde(rename = "idList")]
    pub id_list: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentRequest<'a> {
    pub url: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverRequest<'a> {
    #[serde(rename = "idAttachmentCover")]
    pub id_attachment_cover: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct Card {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "shortUrl", default)]
    pub short_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub name: String,
}
