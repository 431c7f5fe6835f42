//! 파일 시스템 기반 데이터셋 저장소.
//!
//! ```text
//! <root>/<provider>/<name>.json | <name>.msgpack     단일 파일
//! <root>/<provider>/<name>_part<N>.g<G>.json | .msgpack   G세대 N번째 청크 (0부터)
//! <root>/<provider>/<name>_metadata.json                  매니페스트
//! ```
//!
//! 쓰기 순서는 청크 → 매니페스트 → 이전 세대 파일 정리입니다.
//! 새 세대의 청크는 기존 파일과 겹치지 않는 이름으로 쓰므로, 저장이 중간에 실패해도
//! 기존 매니페스트와 그 청크들은 그대로 유효합니다.
//! 모든 파일은 임시 파일에 쓴 뒤 rename으로 교체합니다.

use chrono::Utc;
use etf_core::{StorageConfig, StorageFormat, DEFAULT_MAX_FILE_SIZE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::codec;
use super::key::{validate_component, DatasetKey};
use super::manifest::{
    dataset_name_from_manifest, is_data_file, is_part_file, manifest_file_name,
    part_file_name, part_generation, single_file_name, ChunkEntry, Manifest, MANIFEST_VERSION,
};
use crate::error::{DataError, Result};

/// 인코딩을 마친 저장 계획.
enum Layout {
    Single(Vec<u8>),
    Chunked(Vec<(Range<usize>, Vec<u8>)>),
}

/// 청크 분할 데이터셋 저장소.
///
/// 같은 데이터셋에 대한 저장/로드/삭제는 키별 비동기 뮤텍스로 직렬화됩니다.
/// 여러 프로세스가 같은 디렉토리에 쓰는 경우는 호출 측에서 조율해야 합니다.
pub struct DatasetStore {
    root: PathBuf,
    max_file_size: usize,
    format: StorageFormat,
    locks: Mutex<HashMap<DatasetKey, Arc<Mutex<()>>>>,
}

impl DatasetStore {
    /// 기본 설정(4MB, JSON)으로 저장소 생성.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            format: StorageFormat::Json,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 설정에서 저장소 생성.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.data_dir.clone())
            .with_max_file_size(config.max_file_size)
            .with_format(config.format)
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_format(mut self, format: StorageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// 기본 저장 형식.
    pub fn format(&self) -> StorageFormat {
        self.format
    }

    fn provider_dir(&self, key: &DatasetKey) -> PathBuf {
        self.root.join(key.provider())
    }

    async fn lock(&self, key: &DatasetKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// 기본 형식으로 데이터셋 저장.
    pub async fn save<T: Serialize + Sync>(
        &self,
        key: &DatasetKey,
        records: &[T],
    ) -> Result<Manifest> {
        self.save_as(key, records, self.format).await
    }

    /// 지정한 형식으로 데이터셋 저장.
    ///
    /// 전체 인코딩 크기가 제한 이하이면 단일 파일, 초과하면 청크로 분할합니다.
    /// 제한을 넘는 단일 레코드가 있으면 아무것도 쓰지 않고 `RecordTooLarge`를 반환합니다.
    pub async fn save_as<T: Serialize + Sync>(
        &self,
        key: &DatasetKey,
        records: &[T],
        format: StorageFormat,
    ) -> Result<Manifest> {
        let _guard = self.lock(key).await;

        let layout = self.prepare(records, format)?;
        let dir = self.provider_dir(key);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DataError::io(&dir, e))?;
        let generation = self.next_generation(&dir, key).await?;

        let mut manifest = Manifest {
            version: MANIFEST_VERSION,
            generation,
            provider: key.provider().to_string(),
            name: key.name().to_string(),
            format,
            updated_at: Utc::now(),
            total_count: records.len(),
            total_size: 0,
            chunked: false,
            chunk_count: 0,
            file: None,
            chunks: Vec::new(),
        };

        match layout {
            Layout::Single(bytes) => {
                let file = single_file_name(key.name(), format);
                write_atomic(&dir.join(&file), &bytes).await?;
                manifest.total_size = bytes.len() as u64;
                manifest.file = Some(file);
            }
            Layout::Chunked(parts) => {
                for (index, (range, bytes)) in parts.into_iter().enumerate() {
                    let file = part_file_name(key.name(), index, generation, format);
                    write_atomic(&dir.join(&file), &bytes).await?;
                    debug!(
                        dataset = %key,
                        chunk = index,
                        records = range.len(),
                        bytes = bytes.len(),
                        "청크 저장"
                    );

                    manifest.total_size += bytes.len() as u64;
                    manifest.chunks.push(ChunkEntry {
                        index,
                        file,
                        start: range.start,
                        count: range.len(),
                        size: bytes.len() as u64,
                    });
                }
                manifest.chunked = true;
                manifest.chunk_count = manifest.chunks.len();
            }
        }

        let manifest_path = dir.join(manifest_file_name(key.name()));
        write_atomic(&manifest_path, &serde_json::to_vec_pretty(&manifest)?).await?;

        let keep: HashSet<&str> = manifest.referenced_files().into_iter().collect();
        self.remove_stale(&dir, key, &keep).await;

        info!(
            dataset = %key,
            format = %format,
            generation,
            records = manifest.total_count,
            chunks = manifest.chunk_count,
            bytes = manifest.total_size,
            "데이터셋 저장 완료"
        );

        Ok(manifest)
    }

    /// 이번 저장에 쓸 세대 번호.
    ///
    /// 현재 매니페스트의 세대와 디렉토리에 남은 청크 파일(실패한 저장의 잔여물 포함)의
    /// 세대 중 가장 큰 값보다 1 큽니다. 읽을 수 없는 매니페스트는 무시합니다.
    async fn next_generation(&self, dir: &Path, key: &DatasetKey) -> Result<u64> {
        let mut latest = match self.read_manifest(key).await {
            Ok(Some(manifest)) => manifest.generation,
            Ok(None) => 0,
            Err(e) => {
                warn!(dataset = %key, error = %e, "기존 매니페스트를 읽을 수 없어 덮어씁니다");
                0
            }
        };

        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| DataError::io(dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::io(dir, e))?
        {
            if let Some(generation) = entry
                .file_name()
                .to_str()
                .and_then(|file_name| part_generation(key.name(), file_name))
            {
                latest = latest.max(generation);
            }
        }

        Ok(latest + 1)
    }

    /// 레코드를 파일 단위로 인코딩합니다. 디스크는 건드리지 않습니다.
    fn prepare<T: Serialize>(&self, records: &[T], format: StorageFormat) -> Result<Layout> {
        let whole = codec::encode(format, records)?;
        if records.is_empty() || whole.len() <= self.max_file_size {
            return Ok(Layout::Single(whole));
        }
        drop(whole);

        let sizes = records
            .iter()
            .map(|record| codec::record_size(format, record))
            .collect::<Result<Vec<_>>>()?;
        let ranges = codec::plan_chunks(format, &sizes, self.max_file_size)?;

        let mut parts = Vec::with_capacity(ranges.len());
        for range in ranges {
            let bytes = codec::encode(format, &records[range.clone()])?;
            if bytes.len() > self.max_file_size {
                return Err(DataError::SerializationError(format!(
                    "chunk {:?} encoded to {} bytes, over the {} byte limit",
                    range,
                    bytes.len(),
                    self.max_file_size
                )));
            }
            parts.push((range, bytes));
        }

        Ok(Layout::Chunked(parts))
    }

    /// 새 매니페스트가 참조하지 않는 이전 세대 데이터 파일 삭제.
    ///
    /// 매니페스트가 이미 기록된 뒤이므로 실패해도 경고만 남깁니다.
    async fn remove_stale(&self, dir: &Path, key: &DatasetKey, keep: &HashSet<&str>) {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dataset = %key, error = %e, "이전 파일 정리 실패");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if is_data_file(key.name(), file_name) && !keep.contains(file_name) {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => debug!(dataset = %key, file = file_name, "이전 파일 삭제"),
                    Err(e) => warn!(dataset = %key, file = file_name, error = %e, "이전 파일 삭제 실패"),
                }
            }
        }
    }

    /// 데이터셋 로드.
    ///
    /// 매니페스트가 있으면 기록된 순서대로 파일을 읽어 이어 붙이고 개수를 검증합니다.
    /// 매니페스트가 없는데 청크 파일이 남아 있으면 부분 로드 대신 `DataCorruption`을 반환합니다.
    pub async fn load<T: DeserializeOwned>(&self, key: &DatasetKey) -> Result<Vec<T>> {
        let _guard = self.lock(key).await;

        let records = match self.read_manifest(key).await? {
            Some(manifest) => self.load_with_manifest(key, &manifest).await?,
            None => self.load_without_manifest(key).await?,
        };

        debug!(dataset = %key, records = records.len(), "데이터셋 로드");
        Ok(records)
    }

    async fn load_with_manifest<T: DeserializeOwned>(
        &self,
        key: &DatasetKey,
        manifest: &Manifest,
    ) -> Result<Vec<T>> {
        manifest
            .check_layout()
            .map_err(|reason| DataError::corruption(key, reason))?;

        let dir = self.provider_dir(key);

        if let Some(file) = &manifest.file {
            let records: Vec<T> =
                read_records(key, &dir.join(file), manifest.format, Some(manifest.total_size)).await?;
            if records.len() != manifest.total_count {
                return Err(DataError::corruption(
                    key,
                    format!(
                        "{} holds {} records, manifest total is {}",
                        file,
                        records.len(),
                        manifest.total_count
                    ),
                ));
            }
            return Ok(records);
        }

        let mut records = Vec::with_capacity(manifest.total_count);
        for chunk in &manifest.chunks {
            if records.len() != chunk.start {
                return Err(DataError::corruption(
                    key,
                    format!(
                        "chunk {} starts at {} but {} records precede it",
                        chunk.index,
                        chunk.start,
                        records.len()
                    ),
                ));
            }

            let mut part: Vec<T> =
                read_records(key, &dir.join(&chunk.file), manifest.format, Some(chunk.size)).await?;
            if part.len() != chunk.count {
                return Err(DataError::corruption(
                    key,
                    format!(
                        "{} holds {} records, manifest says {}",
                        chunk.file,
                        part.len(),
                        chunk.count
                    ),
                ));
            }
            records.append(&mut part);
        }

        if records.len() != manifest.total_count {
            return Err(DataError::corruption(
                key,
                format!(
                    "loaded {} records, manifest total is {}",
                    records.len(),
                    manifest.total_count
                ),
            ));
        }

        Ok(records)
    }

    async fn load_without_manifest<T: DeserializeOwned>(&self, key: &DatasetKey) -> Result<Vec<T>> {
        let dir = self.provider_dir(key);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DataError::NotFound(key.to_string()));
            }
            Err(e) => return Err(DataError::io(&dir, e)),
        };

        let mut found = HashSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::io(&dir, e))?
        {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if is_part_file(key.name(), file_name) {
                return Err(DataError::corruption(
                    key,
                    format!("{} exists without a manifest", file_name),
                ));
            }
            found.insert(file_name.to_string());
        }

        for format in StorageFormat::ALL {
            let file = single_file_name(key.name(), format);
            if found.contains(&file) {
                return read_records(key, &dir.join(&file), format, None).await;
            }
        }

        Err(DataError::NotFound(key.to_string()))
    }

    async fn read_manifest(&self, key: &DatasetKey) -> Result<Option<Manifest>> {
        let path = self.provider_dir(key).join(manifest_file_name(key.name()));
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DataError::io(&path, e)),
        };

        let manifest: Manifest = serde_json::from_slice(&bytes)
            .map_err(|e| DataError::corruption(key, format!("unreadable manifest: {}", e)))?;

        if manifest.name != key.name() || !manifest.provider.eq_ignore_ascii_case(key.provider()) {
            return Err(DataError::corruption(
                key,
                format!(
                    "manifest describes {}/{}",
                    manifest.provider, manifest.name
                ),
            ));
        }

        Ok(Some(manifest))
    }

    /// 매니페스트 조회. 없으면 `None`.
    pub async fn manifest(&self, key: &DatasetKey) -> Result<Option<Manifest>> {
        self.read_manifest(key).await
    }

    /// 데이터셋 삭제. 매니페스트를 먼저 지운 뒤 데이터 파일을 지웁니다.
    ///
    /// 삭제할 파일이 하나라도 있었으면 `true`.
    pub async fn delete(&self, key: &DatasetKey) -> Result<bool> {
        let _guard = self.lock(key).await;
        let dir = self.provider_dir(key);
        let mut existed = false;

        let manifest_path = dir.join(manifest_file_name(key.name()));
        match fs::remove_file(&manifest_path).await {
            Ok(()) => existed = true,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(DataError::io(&manifest_path, e)),
        }

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(existed),
            Err(e) => return Err(DataError::io(&dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::io(&dir, e))?
        {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if is_data_file(key.name(), file_name) {
                let path = entry.path();
                fs::remove_file(&path)
                    .await
                    .map_err(|e| DataError::io(&path, e))?;
                existed = true;
            }
        }

        if existed {
            info!(dataset = %key, "데이터셋 삭제");
        }
        Ok(existed)
    }

    /// 매니페스트가 있는 데이터셋 목록 (운용사 지정 시 해당 운용사만).
    pub async fn list(&self, provider: Option<&str>) -> Result<Vec<DatasetKey>> {
        let providers = match provider {
            Some(provider) => {
                validate_component("provider", provider)?;
                vec![provider.to_lowercase()]
            }
            None => self.provider_dirs().await?,
        };

        let mut keys = Vec::new();
        for provider in providers {
            let dir = self.root.join(&provider);
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(DataError::io(&dir, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| DataError::io(&dir, e))?
            {
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str().and_then(dataset_name_from_manifest) else {
                    continue;
                };
                if let Ok(key) = DatasetKey::new(&provider, name) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn provider_dirs(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DataError::io(&self.root, e)),
        };

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::io(&self.root, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_component("provider", name).is_ok() {
                    dirs.push(name.to_string());
                }
            }
        }

        Ok(dirs)
    }

    /// 매니페스트의 `updated_at`이 `max_age` 이내인지 확인.
    pub async fn is_fresh(&self, key: &DatasetKey, max_age: chrono::Duration) -> Result<bool> {
        Ok(self
            .manifest(key)
            .await?
            .is_some_and(|m| m.age(Utc::now()) < max_age))
    }
}

/// 데이터 파일 하나를 읽어 디코딩.
///
/// 파일이 없거나, 크기가 매니페스트 기록(`expected_size`)과 다르거나, 디코딩에 실패하면
/// 데이터 손상으로 봅니다.
async fn read_records<T: DeserializeOwned>(
    key: &DatasetKey,
    path: &Path,
    format: StorageFormat,
    expected_size: Option<u64>,
) -> Result<Vec<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DataError::corruption(
                key,
                format!("missing file {}", path.display()),
            ));
        }
        Err(e) => return Err(DataError::io(path, e)),
    };

    if let Some(expected) = expected_size {
        if bytes.len() as u64 != expected {
            return Err(DataError::corruption(
                key,
                format!(
                    "{} is {} bytes, manifest says {}",
                    path.display(),
                    bytes.len(),
                    expected
                ),
            ));
        }
    }

    codec::decode(format, &bytes)
        .map_err(|e| DataError::corruption(key, format!("{}: {}", path.display(), e)))
}

/// 임시 파일에 쓴 뒤 rename으로 교체.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dataset");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, bytes)
        .await
        .map_err(|e| DataError::io(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(DataError::io(path, e));
    }

    Ok(())
}
