use thiserror::Error;

/// key (1) + update authority (32) + mint (32)
const NAME_OFFSET: usize = 65;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata account truncated at offset {0}")]
    Truncated(usize),

    #[error("metadata string at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

/// Decode the leading fields of a Metaplex token-metadata account.
///
/// Strings are Borsh-encoded (u32 little-endian length, then bytes) and
/// right-padded with NULs on chain, which are trimmed here.
pub fn decode_metadata(data: &[u8]) -> Result<TokenMetadata, MetadataError> {
    let mut offset = NAME_OFFSET;
    let name = read_string(data, &mut offset)?;
    let symbol = read_string(data, &mut offset)?;
    let uri = read_string(data, &mut offset)?;
    Ok(TokenMetadata { name, symbol, uri })
}

fn read_string(data: &[u8], offset: &mut usize) -> Result<String, MetadataError> {
    let start = *offset;
    let len_bytes: [u8; 4] = data
        .get(start..start + 4)
        .and_then(|b| b.try_into().ok())
        .ok_or(MetadataError::Truncated(start))?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let body_start = start + 4;
    let body = data
        .get(body_start..body_start + len)
        .ok_or(MetadataError::Truncated(body_start))?;
    *offset = body_start + len;

    let s = std::str::from_utf8(body).map_err(|_| MetadataError::InvalidUtf8(body_start))?;
    Ok(s.trim_end_matches('\0').trim().to_string())
}
