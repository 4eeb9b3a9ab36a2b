use url::Url;

use crate::LoginError;

/// How parameter values are written into the authorization query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryEncoding {
    /// Values are appended verbatim. The existing callback handler expects this.
    #[default]
    Raw,
    /// Values are form-urlencoded.
    PercentEncoded,
}

pub(crate) fn build_url(
    base: &str,
    params: &[(String, String)],
    encoding: QueryEncoding,
) -> Result<String, LoginError> {
    match encoding {
        QueryEncoding::Raw => {
            let query = params
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            Ok(format!("{base}?{query}"))
        }
        QueryEncoding::PercentEncoded => {
            let mut url = Url::parse(base)?;
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in params {
                    pairs.append_pair(key, value);
                }
            }
            Ok(url.to_string())
        }
    }
}
