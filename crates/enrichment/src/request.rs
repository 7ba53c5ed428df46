use catalog::PlaceId;

/// Identifies one popup lookup. Tokens increase monotonically per
/// `PopupRequests`, so a later request always supersedes an earlier one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// Tracks which popup lookup is current so late responses can be dropped.
#[derive(Debug, Default)]
pub struct PopupRequests {
    next: u64,
    current: Option<(RequestToken, PlaceId)>,
}

impl PopupRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a lookup for `place`, superseding any in-flight one.
    pub fn begin(&mut self, place: PlaceId) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.current = Some((token, place));
        token
    }

    pub fn current(&self) -> Option<(RequestToken, PlaceId)> {
        self.current
    }

    /// Hands back `value` only when `token` is still the current request.
    pub fn accept<T>(&mut self, token: RequestToken, value: T) -> Option<(PlaceId, T)> {
        match self.current {
            Some((current, place)) if current == token => {
                self.current = None;
                Some((place, value))
            }
            _ => {
                tracing::debug!(token = token.0, "dropping stale summary response");
                None
            }
        }
    }

    /// Popup closed; whatever is in flight is stale now.
    pub fn cancel(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::PopupRequests;
    use catalog::PlaceId;

    #[test]
    fn only_latest_request_is_accepted() {
        let mut requests = PopupRequests::new();
        let first = requests.begin(PlaceId(1));
        let second = requests.begin(PlaceId(2));
        assert!(second > first);

        assert_eq!(requests.accept(first, "late"), None);
        assert_eq!(requests.accept(second, "fresh"), Some((PlaceId(2), "fresh")));
        // Consumed.
        assert_eq!(requests.accept(second, "again"), None);
    }

    #[test]
    fn cancel_drops_in_flight_request() {
        let mut requests = PopupRequests::new();
        let token = requests.begin(PlaceId(7));
        requests.cancel();
        assert_eq!(requests.current(), None);
        assert_eq!(requests.accept(token, ()), None);
    }
}
