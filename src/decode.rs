//! Line-oriented text decoding for legacy container contents.
//!
//! A single pass over the byte stream, one byte at a time, with exactly one
//! piece of state: whether the previous byte was a carriage return. That is
//! enough to honor all three line-ending conventions at once (CR for old
//! Apple/Mac text, LF for Unix, CRLF pairs collapsing to a single break).
//! Control bytes are rendered as Unicode control pictures instead of being
//! written raw to the terminal.

use std::io::{BufReader, Read, Write};

use crate::error::NestArcError;

/// Character-encoding variant selected from the owning container's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Plain 7-bit passthrough; bytes above 0x7F map through identity.
    SevenBit,
    /// High-ASCII: the high bit is stripped before classification.
    HighAscii,
    /// Mac OS Roman mapped to host characters.
    MacRoman,
}

/// High half of the Mac OS Roman code page (0x80..=0xFF). The low half is
/// ASCII and is handled by the classification path directly.
#[rustfmt::skip]
const MAC_ROMAN_HIGH: [char; 128] = [
    'Ä', 'Å', 'Ç', 'É', 'Ñ', 'Ö', 'Ü', 'á', 'à', 'â', 'ä', 'ã', 'å', 'ç', 'é', 'è',
    'ê', 'ë', 'í', 'ì', 'î', 'ï', 'ñ', 'ó', 'ò', 'ô', 'ö', 'õ', 'ú', 'ù', 'û', 'ü',
    '†', '°', '¢', '£', '§', '•', '¶', 'ß', '®', '©', '™', '´', '¨', '≠', 'Æ', 'Ø',
    '∞', '±', '≤', '≥', '¥', 'µ', '∂', '∑', '∏', 'π', '∫', 'ª', 'º', 'Ω', 'æ', 'ø',
    '¿', '¡', '¬', '√', 'ƒ', '≈', '∆', '«', '»', '…', '\u{a0}', 'À', 'Ã', 'Õ', 'Œ', 'œ',
    '–', '—', '“', '”', '‘', '’', '÷', '◊', 'ÿ', 'Ÿ', '⁄', '€', '‹', '›', 'ﬁ', 'ﬂ',
    '‡', '·', '‚', '„', '‰', 'Â', 'Ê', 'Á', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', 'Ó', 'Ô',
    '\u{f8ff}', 'Ò', 'Ú', 'Û', 'Ù', 'ı', 'ˆ', '˜', '¯', '˘', '˙', '˚', '¸', '˝', '˛', 'ˇ',
];

const CR: u8 = 0x0d;
const LF: u8 = 0x0a;
const DEL: u8 = 0x7f;

/// Byte-at-a-time line decoder.
pub struct LineDecoder {
    encoding: TextEncoding,
    last_was_cr: bool,
    buf: String,
}

impl LineDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            last_was_cr: false,
            buf: String::new(),
        }
    }

    /// Feeds one byte; invokes `emit` with each completed line.
    pub fn push_byte(&mut self, byte: u8, emit: &mut dyn FnMut(&str)) {
        let b = match self.encoding {
            TextEncoding::HighAscii => byte & 0x7f,
            _ => byte,
        };

        let after_cr = self.last_was_cr;
        self.last_was_cr = b == CR;

        match b {
            CR => {
                emit(&self.buf);
                self.buf.clear();
            }
            LF if after_cr => {
                // Second half of a CRLF pair; the CR already emitted.
            }
            LF => {
                emit(&self.buf);
                self.buf.clear();
            }
            _ => self.buf.push(self.display_char(b)),
        }
    }

    /// Flushes a trailing unterminated line, if any.
    pub fn finish(&mut self, emit: &mut dyn FnMut(&str)) {
        if !self.buf.is_empty() {
            emit(&self.buf);
            self.buf.clear();
        }
        self.last_was_cr = false;
    }

    fn display_char(&self, b: u8) -> char {
        if b < 0x20 {
            // U+2400 block holds pictures for C0 controls in code order.
            return char::from_u32(0x2400 + b as u32).unwrap_or('\u{fffd}');
        }
        if b == DEL {
            return '\u{2421}';
        }
        match self.encoding {
            TextEncoding::MacRoman if b >= 0x80 => MAC_ROMAN_HIGH[(b - 0x80) as usize],
            _ => b as char,
        }
    }
}

/// Streams a data fork through the decoder, writing one host line per
/// decoded line. A read fault is reported with `entry_path` and aborts the
/// stream.
pub fn decode_stream(
    reader: Box<dyn Read>,
    encoding: TextEncoding,
    entry_path: &str,
    out: &mut dyn Write,
) -> Result<(), NestArcError> {
    let mut decoder = LineDecoder::new(encoding);
    let mut failed = false;
    {
        let mut write_line = |line: &str| {
            if writeln!(out, "{line}").is_err() {
                failed = true;
            }
        };
        for byte in BufReader::new(reader).bytes() {
            let byte = byte.map_err(|e| {
                NestArcError::on_entry(entry_path, NestArcError::io(e, entry_path))
            })?;
            decoder.push_byte(byte, &mut write_line);
        }
        decoder.finish(&mut write_line);
    }
    if failed {
        return Err(NestArcError::on_entry(
            entry_path,
            NestArcError::from(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "output stream closed",
            )),
        ));
    }
    Ok(())
}
