//! Text rendering for Postgres binary formats that have no lossless sqlx type.
//!
//! Each wrapper decodes one column (or array element) straight from the
//! bytes the server sent, producing the same text `psql` would print.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{FixedOffset, NaiveTime};
use sqlx::decode::Decode;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::{Postgres, Type};

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

/// NUMERIC of any precision, including NaN and the infinities.
pub(crate) struct NumericText(pub(crate) String);

/// INET or CIDR address.
pub(crate) struct NetworkText(pub(crate) String);

/// MACADDR or MACADDR8.
pub(crate) struct MacAddrText(pub(crate) String);

macro_rules! text_in_binary {
    ($name:ident, $pg:literal, $render:path) => {
        impl Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                PgTypeInfo::with_name($pg)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
                match value.format() {
                    PgValueFormat::Binary => $render(value.as_bytes()?).map($name),
                    PgValueFormat::Text => Ok($name(value.as_str()?.to_owned())),
                }
            }
        }
    };
}

text_in_binary!(NumericText, "numeric", numeric_text);
text_in_binary!(NetworkText, "inet", network_text);
text_in_binary!(MacAddrText, "macaddr", macaddr_text);

/// Render the binary NUMERIC layout: ndigits, weight, sign and display
/// scale as big-endian i16s, then base-10000 digits.
pub(crate) fn numeric_text(buf: &[u8]) -> Result<String, BoxDynError> {
    if buf.len() < 8 {
        return Err("numeric value shorter than its header".into());
    }
    let word = |at: usize| u16::from_be_bytes([buf[at], buf[at + 1]]);
    let ndigits = word(0) as usize;
    let weight = i32::from(word(2) as i16);
    let sign = word(4);
    let dscale = word(6) as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".into()),
        NUMERIC_PINF => return Ok("Infinity".into()),
        NUMERIC_NINF => return Ok("-Infinity".into()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("invalid numeric sign {:#06x}", other).into()),
    }
    if buf.len() < 8 + ndigits * 2 {
        return Err("numeric value shorter than its digit count".into());
    }

    let digits: Vec<u16> = buf[8..8 + ndigits * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let digit_at = |pos: i32| {
        usize::try_from(pos)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for pos in 0..=weight {
            if pos == 0 {
                out.push_str(&digit_at(pos).to_string());
            } else {
                out.push_str(&format!("{:04}", digit_at(pos)));
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut pos = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit_at(pos)));
            pos += 1;
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

/// Render the binary INET/CIDR layout: family, prefix bits, cidr flag,
/// address length, address bytes.
pub(crate) fn network_text(buf: &[u8]) -> Result<String, BoxDynError> {
    if buf.len() < 4 {
        return Err("inet value shorter than its header".into());
    }
    let (family, bits, is_cidr, len) = (buf[0], buf[1], buf[2] != 0, buf[3] as usize);
    let addr = buf
        .get(4..4 + len)
        .ok_or("inet value shorter than its address")?;

    let (text, max_bits) = match (family, addr.len()) {
        (PGSQL_AF_INET, 4) => (Ipv4Addr::new(addr[0], addr[1], addr[2], addr[3]).to_string(), 32),
        (PGSQL_AF_INET6, 16) => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(addr);
            (Ipv6Addr::from(octets).to_string(), 128)
        }
        _ => return Err(format!("unsupported inet family {} with {} bytes", family, len).into()),
    };

    if is_cidr || bits != max_bits {
        Ok(format!("{}/{}", text, bits))
    } else {
        Ok(text)
    }
}

pub(crate) fn macaddr_text(buf: &[u8]) -> Result<String, BoxDynError> {
    if buf.len() != 6 && buf.len() != 8 {
        return Err(format!("macaddr value has {} bytes", buf.len()).into());
    }
    Ok(buf
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":"))
}

/// Interval in the server's default `postgres` output style,
/// e.g. `1 year 2 mons -3 days +04:05:06.5`.
pub(crate) fn interval_text(interval: &PgInterval) -> String {
    let years = interval.months / 12;
    let months = interval.months % 12;

    let mut out = String::new();
    let mut is_zero = true;
    let mut is_before = false;
    for (value, unit) in [(years, "year"), (months, "mon"), (interval.days, "day")] {
        if value == 0 {
            continue;
        }
        if !is_zero {
            out.push(' ');
        }
        if is_before && value > 0 {
            out.push('+');
        }
        out.push_str(&format!("{} {}{}", value, unit, if value != 1 { "s" } else { "" }));
        is_before = value < 0;
        is_zero = false;
    }

    let micros = interval.microseconds;
    if is_zero || micros != 0 {
        if !is_zero {
            out.push(' ');
        }
        if micros < 0 {
            out.push('-');
        } else if is_before {
            out.push('+');
        }
        let abs = micros.unsigned_abs();
        let secs = abs / 1_000_000;
        out.push_str(&format!(
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        ));
        push_fraction(&mut out, (abs % 1_000_000) as u32);
    }
    out
}

/// TIMETZ as `HH:MM:SS[.ffffff]+HH[:MM]`.
pub(crate) fn timetz_text(time: NaiveTime, offset: FixedOffset) -> String {
    use chrono::Timelike;

    let mut out = time.format("%H:%M:%S").to_string();
    push_fraction(&mut out, time.nanosecond() / 1_000);

    let seconds = offset.local_minus_utc();
    let abs = seconds.unsigned_abs();
    out.push(if seconds < 0 { '-' } else { '+' });
    out.push_str(&format!("{:02}", abs / 3600));
    if abs % 3600 != 0 {
        out.push_str(&format!(":{:02}", (abs / 60) % 60));
    }
    if abs % 60 != 0 {
        out.push_str(&format!(":{:02}", abs % 60));
    }
    out
}

/// Append `.ffffff` with trailing zeros trimmed; nothing for whole seconds.
fn push_fraction(out: &mut String, micros: u32) {
    if micros == 0 {
        return;
    }
    let digits = format!("{:06}", micros);
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}
