use super::{ParamValue, QueryParameter};

/// Decodes a raw query string into parameters, keeping their order.
///
/// Repeated plain names are all kept. Bracketed names (`a[]`, `a[key]`) are
/// folded into one structured parameter placed where the base name first
/// appears.
pub fn parse_query(raw: &str) -> Vec<QueryParameter> {
    let mut params: Vec<QueryParameter> = Vec::new();

    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = String::from_utf8_lossy(&decode_component(raw_key)).into_owned();
        let value = decode_component(raw_value);

        let Some((base, sub_key)) = split_bracketed(&key) else {
            params.push(QueryParameter::text(key, value));
            continue;
        };

        let existing = params
            .iter_mut()
            .filter(|p| p.name == base)
            .find_map(|p| match &mut p.value {
                ParamValue::Structured(entries) => Some(entries),
                ParamValue::Text(_) => None,
            });
        if let Some(entries) = existing {
            entries.push((sub_key.to_string(), value));
            continue;
        }

        params.push(QueryParameter {
            name: base.to_string(),
            value: ParamValue::Structured(vec![(sub_key.to_string(), value)]),
        });
    }

    params
}

fn decode_component(raw: &str) -> Vec<u8> {
    let spaced = raw.replace('+', " ");
    // Decoded bytes need not be UTF-8; the upstream echoes them as sent
    urlencoding::decode_binary(spaced.as_bytes()).into_owned()
}

fn split_bracketed(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    if open == 0 || !key.ends_with(']') {
        return None;
    }
    Some((&key[..open], &key[open + 1..key.len() - 1]))
}
