use crate::models::Capability;

/// Decides which platform a device token belongs to
pub trait TokenClassifier: Send + Sync {
    fn classify(&self, token: &str) -> Capability;
}

/// FCM registration tokens contain a `:` separator; APNs tokens are plain hex.
#[derive(Debug, Clone, Copy)]
pub struct SeparatorClassifier {
    separator: char,
}

impl SeparatorClassifier {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl Default for SeparatorClassifier {
    fn default() -> Self {
        Self::new(':')
    }
}

impl TokenClassifier for SeparatorClassifier {
    fn classify(&self, token: &str) -> Capability {
        if token.contains(self.separator) {
            Capability::Android
        } else {
            Capability::Ios
        }
    }
}

/// Tokens split by platform, relative order preserved
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partitioned<'a> {
    pub android: Vec<&'a str>,
    pub ios: Vec<&'a str>,
}

pub fn partition<'a, S: AsRef<str>>(
    classifier: &dyn TokenClassifier,
    tokens: &'a [S],
) -> Partitioned<'a> {
    let mut out = Partitioned::default();
    for token in tokens {
        let token = token.as_ref();
        match classifier.classify(token) {
            Capability::Android => out.android.push(token),
            Capability::Ios => out.ios.push(token),
        }
    }
    out
}
