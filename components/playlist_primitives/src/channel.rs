use serde::{Deserialize, Serialize};

/// Channel-level metadata cached once per channel listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Display name
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub uploader_id: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default)]
    pub playlist_count: u64,
}

impl ChannelInfo {
    /// Best available human readable name
    pub fn display_name(&self) -> &str {
        self.channel
            .as_deref()
            .or(self.uploader.as_deref())
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_channel_then_uploader() {
        let mut info = ChannelInfo {
            uploader: Some("Uploader".into()),
            ..Default::default()
        };
        assert_eq!(info.display_name(), "Uploader");

        info.channel = Some("Channel".into());
        assert_eq!(info.display_name(), "Channel");

        assert_eq!(ChannelInfo::default().display_name(), "Unknown");
    }

    #[test]
    fn null_fields_deserialize() {
        let json = r#"{"channel_id":null,"channel":"Music","playlist_count":4}"#;
        let info: ChannelInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.channel.as_deref(), Some("Music"));
        assert_eq!(info.playlist_count, 4);
        assert!(info.channel_id.is_none());
    }
}
