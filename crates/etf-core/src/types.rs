//! 공용 타입.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 데이터셋 파일 저장 형식.
///
/// 매니페스트(`*_metadata.json`)는 형식과 무관하게 항상 JSON입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub enum StorageFormat {
    /// 들여쓰기된 JSON 배열 (사람이 읽기 쉬움, git diff 용이)
    #[default]
    Json,
    /// 필드명을 포함한 MessagePack 배열 (작고 빠름)
    MsgPack,
}

impl StorageFormat {
    /// 모든 형식.
    pub const ALL: [StorageFormat; 2] = [StorageFormat::Json, StorageFormat::MsgPack];

    /// 파일 확장자 (점 제외).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::MsgPack => "msgpack",
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StorageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "msgpack" | "messagepack" => Ok(Self::MsgPack),
            _ => Err(format!("Unknown storage format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_format_names() {
        assert_eq!(StorageFormat::MsgPack.extension(), "msgpack");
        assert_eq!(
            serde_json::to_string(&StorageFormat::MsgPack).unwrap(),
            r#""msgpack""#
        );
        assert_eq!("JSON".parse::<StorageFormat>().unwrap(), StorageFormat::Json);
        assert!("csv".parse::<StorageFormat>().is_err());
    }
}
