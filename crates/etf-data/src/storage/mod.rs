//! 청크 분할 데이터셋 저장소.
//!
//! 운용사별 레코드 목록을 JSON 또는 MessagePack 파일로 저장합니다.
//! 인코딩 크기가 제한(기본 4MB)을 넘으면 `<name>_part<N>.g<G>` 파일들로 나누고
//! `<name>_metadata.json` 매니페스트에 청크 구성을 기록합니다.

pub mod codec;
pub mod key;
pub mod manifest;
pub mod store;

pub use key::DatasetKey;
pub use manifest::{ChunkEntry, Manifest, MANIFEST_VERSION};
pub use store::DatasetStore;
