use crate::resource::Resource;
use crate::types::{Class, Rcode, Type};
use crate::Response;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

/// Identifies a cached response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub class: Class,
    pub r#type: Type,
    pub name: String,
}

impl CacheKey {
    pub fn new(name: &str, r#type: Type, class: Class) -> CacheKey {
        CacheKey {
            class,
            r#type,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}-{}", self.class, self.r#type, self.name)
    }
}

/// Successful responses, keyed by their question.
///
/// Entries are never evicted on a timer. A lookup that finds any record
/// with no TTL left treats the entry as missing and removes it. Replies
/// without answers expire with the minimum of the SOA in their authority
/// section; a reply with no records at all stays until [`ResponseCache::clear`].
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, Arc<Response>>>,
}

impl ResponseCache {
    pub fn new() -> ResponseCache {
        Self::default()
    }

    /// Stores `response` under the key of its first question.
    ///
    /// Only error free NoError responses with at least one question are
    /// kept. Returns whether it was stored.
    pub fn insert(&self, response: &Response) -> bool {
        if !response.error.is_empty() || response.header.rcode() != Rcode::NoError {
            return false;
        }

        let question = match response.questions.first() {
            Some(q) => q,
            None => return false,
        };

        let key = CacheKey::new(question.name(), question.r#type, question.class);
        log::trace!("caching {}", key);

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(response.clone()));

        true
    }

    /// Looks up `key`, with every record's TTL reduced by the time since it
    /// was received.
    pub fn get(&self, key: &CacheKey) -> Option<Response> {
        self.get_at(key, SystemTime::now())
    }

    /// As [`ResponseCache::get`], pretending the current time is `now`.
    pub fn get_at(&self, key: &CacheKey, now: SystemTime) -> Option<Response> {
        let cached = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();

        let cached = match cached {
            Some(cached) => cached,
            None => {
                log::trace!("cache miss for {}", key);
                return None;
            }
        };

        // Whole seconds only, like the TTLs themselves.
        let age = now.duration_since(cached.timestamp).unwrap_or_default();
        let age = Duration::from_secs(age.as_secs());

        let mut response = (*cached).clone();
        let records = response
            .answers
            .iter_mut()
            .chain(response.authorities.iter_mut())
            .chain(response.additionals.iter_mut());

        let mut expired = false;
        for record in records {
            record.time_lived = age;
            expired |= record.ttl().is_zero();
        }

        // A negative answer lives no longer than its SOA's minimum. See rfc2308#section-5.
        if response.answers.is_empty() {
            let minimum = response.authorities.iter().find_map(|r| match &r.resource {
                Resource::SOA(soa) => Some(soa.minimum),
                _ => None,
            });
            if let Some(minimum) = minimum {
                expired |= age >= minimum;
            }
        }

        if expired {
            log::trace!("cache entry for {} has expired", key);
            self.remove_if_same(key, &cached);
            return None;
        }

        log::trace!("cache hit for {}", key);
        Some(response)
    }

    // Leaves the entry alone if it was replaced since `cached` was read.
    fn remove_if_same(&self, key: &CacheKey, cached: &Arc<Response>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).map_or(false, |current| Arc::ptr_eq(current, cached)) {
            entries.remove(key);
        }
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
