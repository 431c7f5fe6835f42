//! 데이터셋 매니페스트 (`<name>_metadata.json`).
//!
//! 청크 파일명에는 세대 번호가 붙습니다 (`<name>_part<N>.g<G>.<ext>`).
//! 다시 저장할 때는 새 세대 이름으로 청크를 쓰므로, 매니페스트가 교체되기 전까지
//! 이전 세대 파일은 그대로 남습니다.

use chrono::{DateTime, Utc};
use etf_core::StorageFormat;
use serde::{Deserialize, Serialize};

/// 현재 매니페스트 스키마 버전.
pub const MANIFEST_VERSION: u32 = 1;

/// 청크 파일 하나에 대한 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEntry {
    /// 0부터 시작하는 청크 번호
    pub index: usize,
    /// 파일명 (운용사 디렉토리 기준)
    pub file: String,
    /// 전체 레코드 중 시작 위치
    pub start: usize,
    /// 레코드 수
    pub count: usize,
    /// 파일 크기 (바이트)
    pub size: u64,
}

/// 데이터셋 한 세대(generation)를 설명하는 매니페스트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    /// 저장할 때마다 1씩 증가. 세대 표시 없는 청크 파일은 0세대
    #[serde(default)]
    pub generation: u64,
    pub provider: String,
    pub name: String,
    pub format: StorageFormat,
    pub updated_at: DateTime<Utc>,
    pub total_count: usize,
    /// 데이터 파일 크기 합 (매니페스트 제외)
    pub total_size: u64,
    pub chunked: bool,
    pub chunk_count: usize,
    /// 단일 파일 저장 시 파일명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub chunks: Vec<ChunkEntry>,
}

impl Manifest {
    /// 이 매니페스트가 참조하는 데이터 파일 목록.
    pub fn referenced_files(&self) -> Vec<&str> {
        match &self.file {
            Some(file) => vec![file.as_str()],
            None => self.chunks.iter().map(|c| c.file.as_str()).collect(),
        }
    }

    /// 마지막 갱신 이후 경과 시간.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.updated_at
    }

    /// 구조적 일관성 검사.
    ///
    /// 청크 번호가 0부터 연속이고, 시작 위치가 이어지며, 레코드 수 합이
    /// `total_count`와 같은지 확인합니다. 실패 시 사유를 반환합니다.
    pub fn check_layout(&self) -> Result<(), String> {
        if self.version > MANIFEST_VERSION {
            return Err(format!("unsupported manifest version {}", self.version));
        }

        if !self.chunked {
            if self.file.is_none() {
                return Err("single-file manifest without a file name".to_string());
            }
            if !self.chunks.is_empty() {
                return Err("single-file manifest lists chunks".to_string());
            }
            return Ok(());
        }

        if self.chunk_count != self.chunks.len() {
            return Err(format!(
                "chunk_count {} but {} chunks listed",
                self.chunk_count,
                self.chunks.len()
            ));
        }

        let mut expected_start = 0;
        for (i, chunk) in self.chunks.iter().enumerate() {
            if chunk.index != i {
                return Err(format!("chunk {} recorded with index {}", i, chunk.index));
            }
            if chunk.start != expected_start {
                return Err(format!(
                    "chunk {} starts at {}, expected {}",
                    i, chunk.start, expected_start
                ));
            }
            expected_start += chunk.count;
        }

        if expected_start != self.total_count {
            return Err(format!(
                "chunks hold {} records, manifest total is {}",
                expected_start, self.total_count
            ));
        }

        Ok(())
    }
}

/// 단일 데이터 파일명.
pub fn single_file_name(name: &str, format: StorageFormat) -> String {
    format!("{}.{}", name, format.extension())
}

/// `generation` 세대의 N번째 청크 파일명.
pub fn part_file_name(name: &str, index: usize, generation: u64, format: StorageFormat) -> String {
    if generation == 0 {
        format!("{}_part{}.{}", name, index, format.extension())
    } else {
        format!("{}_part{}.g{}.{}", name, index, generation, format.extension())
    }
}

/// 매니페스트 파일명 (형식과 무관하게 JSON).
pub fn manifest_file_name(name: &str) -> String {
    format!("{}_metadata.json", name)
}

/// 매니페스트 파일명에서 데이터셋 이름 추출.
pub fn dataset_name_from_manifest(file_name: &str) -> Option<&str> {
    file_name.strip_suffix("_metadata.json")
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `name` 데이터셋의 청크 파일이면 세대 번호를 반환 (형식 무관).
pub fn part_generation(name: &str, file_name: &str) -> Option<u64> {
    let rest = file_name.strip_prefix(name)?.strip_prefix("_part")?;
    let stem = StorageFormat::ALL.iter().find_map(|format| {
        rest.strip_suffix(format.extension())
            .and_then(|stem| stem.strip_suffix('.'))
    })?;

    match stem.split_once(".g") {
        Some((index, generation)) if is_digits(index) && is_digits(generation) => {
            generation.parse().ok()
        }
        Some(_) => None,
        None if is_digits(stem) => Some(0),
        None => None,
    }
}

/// 파일이 `name` 데이터셋의 청크 파일인지 확인 (형식, 세대 무관).
pub fn is_part_file(name: &str, file_name: &str) -> bool {
    part_generation(name, file_name).is_some()
}

/// 파일이 `name` 데이터셋의 데이터 파일(단일 또는 청크)인지 확인.
pub fn is_data_file(name: &str, file_name: &str) -> bool {
    StorageFormat::ALL
        .iter()
        .any(|format| file_name == single_file_name(name, *format))
        || is_part_file(name, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked(counts: &[usize]) -> Manifest {
        let mut start = 0;
        let chunks: Vec<ChunkEntry> = counts
            .iter()
            .enumerate()
            .map(|(index, &count)| {
                let entry = ChunkEntry {
                    index,
                    file: part_file_name("etf_list", index, 1, StorageFormat::Json),
                    start,
                    count,
                    size: 100,
                };
                start += count;
                entry
            })
            .collect();

        Manifest {
            version: MANIFEST_VERSION,
            generation: 1,
            provider: "ishares".to_string(),
            name: "etf_list".to_string(),
            format: StorageFormat::Json,
            updated_at: Utc::now(),
            total_count: start,
            total_size: 100 * counts.len() as u64,
            chunked: true,
            chunk_count: chunks.len(),
            file: None,
            chunks,
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(single_file_name("etf_list", StorageFormat::MsgPack), "etf_list.msgpack");
        assert_eq!(part_file_name("etf_list", 3, 0, StorageFormat::Json), "etf_list_part3.json");
        assert_eq!(
            part_file_name("etf_list", 3, 12, StorageFormat::MsgPack),
            "etf_list_part3.g12.msgpack"
        );
        assert_eq!(manifest_file_name("etf_list"), "etf_list_metadata.json");
        assert_eq!(dataset_name_from_manifest("etf_list_metadata.json"), Some("etf_list"));
    }

    #[test]
    fn test_part_file_detection() {
        assert!(is_part_file("etf_list", "etf_list_part0.json"));
        assert!(is_part_file("etf_list", "etf_list_part12.msgpack"));
        assert!(is_part_file("etf_list", "etf_list_part2.g7.json"));
        assert!(!is_part_file("etf_list", "etf_list_part2.g.json"));
        assert!(!is_part_file("etf_list", "etf_list_part2.gx.json"));
        assert!(!is_part_file("etf", "etf_partners.json"));
        assert!(!is_part_file("etf_list", "etf_list_part.json"));
        assert!(!is_part_file("etf_list", "etf_list_partx.json"));
        assert!(!is_part_file("etf_list", "etf_list_metadata.json"));
        assert!(!is_part_file("etf", "etf_list_part0.json"));
        assert!(is_data_file("etf_list", "etf_list.json"));
        assert!(!is_data_file("etf_list", ".etf_list.json.tmp"));
    }

    #[test]
    fn test_part_generation() {
        assert_eq!(part_generation("etf_list", "etf_list_part0.json"), Some(0));
        assert_eq!(part_generation("etf_list", "etf_list_part4.g31.msgpack"), Some(31));
        assert_eq!(part_generation("etf_list", "etf_list.json"), None);
        assert_eq!(part_generation("etf_list", ".etf_list_part0.g2.json.tmp"), None);
    }

    #[test]
    fn test_legacy_manifest_without_generation() {
        let mut value = serde_json::to_value(chunked(&[2])).unwrap();
        value.as_object_mut().unwrap().remove("generation");
        let manifest: Manifest = serde_json::from_value(value).unwrap();
        assert_eq!(manifest.generation, 0);
    }

    #[test]
    fn test_check_layout_valid() {
        assert!(chunked(&[3, 3, 1]).check_layout().is_ok());
    }

    #[test]
    fn test_check_layout_detects_gaps() {
        let mut manifest = chunked(&[3, 3, 1]);
        manifest.chunks[1].start = 4;
        assert!(manifest.check_layout().is_err());

        let mut manifest = chunked(&[3, 3]);
        manifest.total_count = 7;
        assert!(manifest.check_layout().is_err());

        let mut manifest = chunked(&[3, 3]);
        manifest.chunk_count = 3;
        assert!(manifest.check_layout().is_err());
    }

    #[test]
    fn test_manifest_serialized_field_names() {
        let value = serde_json::to_value(chunked(&[2])).unwrap();
        assert_eq!(value["total_count"], 2);
        assert_eq!(value["format"], "json");
        assert_eq!(value["generation"], 1);
        assert_eq!(value["chunks"][0]["file"], "etf_list_part0.g1.json");
        assert!(value.get("file").is_none());
    }
}
