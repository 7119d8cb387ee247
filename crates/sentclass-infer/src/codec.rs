//! Tensor codec for Triton raw input/output contents.
//!
//! String (`BYTES`) tensors are a concatenation of `[u32 LE length][UTF-8
//! bytes]` elements with no padding or terminator. Numeric tensors are packed
//! little-endian arrays whose element count comes from the declared shape,
//! never from the buffer length.

use sentclass_core::io::{BYTES, FP32, INT64};
use sentclass_core::{ClassifyError, ModelIo};

const LENGTH_PREFIX: usize = 4;

/// An input tensor ready to be sent as `raw_input_contents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTensor {
    pub name: String,
    pub datatype: String,
    pub shape: Vec<i64>,
    pub data: Vec<u8>,
}

/// One named output tensor from an inference response, still in wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub name: String,
    pub datatype: String,
    pub shape: Vec<i64>,
    pub contents: Vec<u8>,
}

/// Serialize strings into a `BYTES` tensor buffer.
pub fn encode_strings<S: AsRef<str>>(texts: &[S]) -> Result<Vec<u8>, ClassifyError> {
    let total: usize = texts
        .iter()
        .map(|t| LENGTH_PREFIX + t.as_ref().len())
        .sum();
    let mut buf = Vec::with_capacity(total);
    for (index, text) in texts.iter().enumerate() {
        let bytes = text.as_ref().as_bytes();
        buf.extend_from_slice(&length_prefix(index, bytes.len())?);
        buf.extend_from_slice(bytes);
    }
    Ok(buf)
}

fn length_prefix(index: usize, len: usize) -> Result<[u8; LENGTH_PREFIX], ClassifyError> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| ClassifyError::EncodingOverflow { index, len })
}

/// Build the 1-D string input tensor `name` of `datatype` for `texts`.
pub fn encode_input<S: AsRef<str>>(
    name: &str,
    datatype: &str,
    texts: &[S],
) -> Result<EncodedTensor, ClassifyError> {
    Ok(EncodedTensor {
        name: name.to_string(),
        datatype: datatype.to_string(),
        shape: vec![texts.len() as i64],
        data: encode_strings(texts)?,
    })
}

/// Parse a `BYTES` tensor buffer back into strings, in encounter order.
pub fn decode_strings(output: &str, buf: &[u8]) -> Result<Vec<String>, ClassifyError> {
    let mut strings = Vec::new();
    let mut rest = buf;

    while !rest.is_empty() {
        let (prefix, tail) =
            rest.split_first_chunk::<LENGTH_PREFIX>()
                .ok_or_else(|| ClassifyError::TruncatedBuffer {
                    output: output.to_string(),
                    needed: LENGTH_PREFIX,
                    available: rest.len(),
                })?;
        let len = u32::from_le_bytes(*prefix) as usize;
        if tail.len() < len {
            return Err(ClassifyError::TruncatedBuffer {
                output: output.to_string(),
                needed: len,
                available: tail.len(),
            });
        }

        let (chunk, tail) = tail.split_at(len);
        let text = std::str::from_utf8(chunk).map_err(|_| ClassifyError::InvalidUtf8 {
            output: output.to_string(),
            index: strings.len(),
        })?;
        strings.push(text.to_string());
        rest = tail;
    }

    Ok(strings)
}

/// Decode a packed little-endian `FP32` tensor with `shape[0]` elements.
///
/// Values are reconstructed bit-for-bit, NaN payloads included.
pub fn decode_f32(output: &str, shape: &[i64], buf: &[u8]) -> Result<Vec<f32>, ClassifyError> {
    decode_packed(output, shape, buf, f32::from_le_bytes)
}

/// Decode a packed little-endian `INT64` tensor with `shape[0]` elements.
pub fn decode_i64(output: &str, shape: &[i64], buf: &[u8]) -> Result<Vec<i64>, ClassifyError> {
    decode_packed(output, shape, buf, i64::from_le_bytes)
}

fn decode_packed<const N: usize, T>(
    output: &str,
    shape: &[i64],
    buf: &[u8],
    from_le: fn([u8; N]) -> T,
) -> Result<Vec<T>, ClassifyError> {
    let count = element_count(output, shape)?;
    let needed = count
        .checked_mul(N)
        .ok_or_else(|| ClassifyError::InvalidShape {
            output: output.to_string(),
            shape: shape.to_vec(),
        })?;
    if buf.len() < needed {
        return Err(ClassifyError::TruncatedBuffer {
            output: output.to_string(),
            needed,
            available: buf.len(),
        });
    }

    // Trailing bytes past the declared shape are ignored.
    Ok(buf[..needed]
        .chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            from_le(bytes)
        })
        .collect())
}

fn element_count(output: &str, shape: &[i64]) -> Result<usize, ClassifyError> {
    match shape.first() {
        Some(&dim) if dim >= 0 => Ok(dim as usize),
        _ => Err(ClassifyError::InvalidShape {
            output: output.to_string(),
            shape: shape.to_vec(),
        }),
    }
}

/// Locate an output by exact name. Order within the response is not assumed.
pub fn find_output<'a>(outputs: &'a [RawOutput], name: &str) -> Result<&'a RawOutput, ClassifyError> {
    outputs
        .iter()
        .find(|o| o.name == name)
        .ok_or_else(|| ClassifyError::MissingOutput(name.to_string()))
}

/// Reject an output whose declared datatype disagrees with what we decode.
/// An empty datatype is accepted.
pub fn expect_datatype(output: &RawOutput, expected: &'static str) -> Result<(), ClassifyError> {
    if output.datatype.is_empty() || output.datatype == expected {
        Ok(())
    } else {
        Err(ClassifyError::UnexpectedDatatype {
            output: output.name.clone(),
            expected,
            actual: output.datatype.clone(),
        })
    }
}

/// Decode the classifier's `predict` and `score` outputs.
///
/// Other outputs are ignored. Fails if either is absent or if they decode to
/// different lengths.
pub fn decode_predictions(
    outputs: &[RawOutput],
    io: &ModelIo,
) -> Result<(Vec<String>, Vec<f32>), ClassifyError> {
    let predict = find_output(outputs, &io.predict_output)?;
    let score = find_output(outputs, &io.score_output)?;
    expect_datatype(predict, BYTES)?;
    expect_datatype(score, FP32)?;

    let predicts = decode_strings(&predict.name, &predict.contents)?;
    let scores = decode_f32(&score.name, &score.shape, &score.contents)?;
    if predicts.len() != scores.len() {
        return Err(ClassifyError::LengthMismatch {
            what: "predict/score",
            left: predicts.len(),
            right: scores.len(),
        });
    }
    Ok((predicts, scores))
}

/// Decode a named `INT64` output.
pub fn decode_i64_output(outputs: &[RawOutput], name: &str) -> Result<Vec<i64>, ClassifyError> {
    let output = find_output(outputs, name)?;
    expect_datatype(output, INT64)?;
    decode_i64(&output.name, &output.shape, &output.contents)
}

/// Decode a named `BYTES` output.
pub fn decode_strings_output(
    outputs: &[RawOutput],
    name: &str,
) -> Result<Vec<String>, ClassifyError> {
    let output = find_output(outputs, name)?;
    expect_datatype(output, BYTES)?;
    decode_strings(&output.name, &output.contents)
}
