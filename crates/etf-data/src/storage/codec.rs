//! 데이터셋 파일 인코딩과 크기 계산.
//!
//! 청크 분할은 레코드별 인코딩 크기로 파일 크기를 정확히 계산합니다.
//!
//! - JSON (`to_vec_pretty`): `[\n` + 각 레코드(줄마다 2칸 들여쓰기) + `,\n` 구분자 + `\n]`.
//!   레코드 하나는 `len + 2 * 줄바꿈 수 + 4` 바이트를 차지하고 배열 자체는 2 바이트입니다.
//! - MessagePack (`to_vec_named`): 배열 헤더(1/3/5 바이트) + 레코드 바이트의 합.

use etf_core::StorageFormat;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::Range;

use crate::error::{DataError, Result};

/// 레코드 배열 전체 인코딩.
pub fn encode<T: Serialize>(format: StorageFormat, records: &[T]) -> Result<Vec<u8>> {
    match format {
        StorageFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
        StorageFormat::MsgPack => Ok(rmp_serde::to_vec_named(records)?),
    }
}

/// 레코드 배열 디코딩.
pub fn decode<T: DeserializeOwned>(format: StorageFormat, bytes: &[u8]) -> Result<Vec<T>> {
    match format {
        StorageFormat::Json => Ok(serde_json::from_slice(bytes)?),
        StorageFormat::MsgPack => Ok(rmp_serde::from_slice(bytes)?),
    }
}

/// 배열 안에 들어갔을 때 레코드 하나가 차지하는 바이트 수.
pub fn record_size<T: Serialize>(format: StorageFormat, record: &T) -> Result<usize> {
    match format {
        StorageFormat::Json => {
            let bytes = serde_json::to_vec_pretty(record)?;
            let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
            Ok(bytes.len() + 2 * newlines + 4)
        }
        StorageFormat::MsgPack => Ok(rmp_serde::to_vec_named(record)?.len()),
    }
}

/// `count`개 레코드(크기 합 `records_size`)를 담은 파일의 바이트 수.
pub fn array_size(format: StorageFormat, count: usize, records_size: usize) -> usize {
    match format {
        StorageFormat::Json => 2 + records_size,
        StorageFormat::MsgPack => msgpack_array_header(count) + records_size,
    }
}

fn msgpack_array_header(count: usize) -> usize {
    if count < 16 {
        1
    } else if count <= u16::MAX as usize {
        3
    } else {
        5
    }
}

/// 레코드 크기 목록을 파일 크기 제한 이하의 연속 구간으로 나눕니다.
///
/// 앞에서부터 채우다가 다음 레코드를 넣으면 제한을 넘을 때 새 청크를 시작합니다.
/// 레코드 하나만으로 제한을 넘으면 `RecordTooLarge`를 반환합니다.
pub fn plan_chunks(
    format: StorageFormat,
    sizes: &[usize],
    limit: usize,
) -> Result<Vec<Range<usize>>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut acc = 0;

    for (index, &size) in sizes.iter().enumerate() {
        let alone = array_size(format, 1, size);
        if alone > limit {
            return Err(DataError::RecordTooLarge {
                index,
                size: alone,
                limit,
            });
        }

        let count = index - start;
        if count > 0 && array_size(format, count + 1, acc + size) > limit {
            chunks.push(start..index);
            start = index;
            acc = 0;
        }
        acc += size;
    }

    if start < sizes.len() {
        chunks.push(start..sizes.len());
    }

    Ok(chunks)
}
