//! Incremental reconstruction of a single streamed tool call
//!
//! The upstream protocol may split one tool call's arguments string over many
//! chunks. The accumulator captures the call id and function name on first
//! sighting and concatenates argument fragments in arrival order. Exactly one
//! tool call is tracked at a time; parallel tool calls are not supported.

use serde_json::{Map, Value};

use super::ToolCallDelta;
use crate::llm::ToolCallRequest;

#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tool-call delta into the accumulated state
    ///
    /// Id and name are captured once and immutable thereafter; argument
    /// fragments are appended in arrival order.
    pub fn observe(&mut self, delta: &ToolCallDelta) {
        if self.id.is_none() {
            if let Some(id) = &delta.id {
                self.id = Some(id.clone());
            }
        }

        if let Some(function) = &delta.function {
            if self.name.is_none() {
                if let Some(name) = &function.name {
                    self.name = Some(name.clone());
                }
            }
            if let Some(fragment) = &function.arguments {
                self.arguments.push_str(fragment);
            }
        }
    }

    /// The function name, once the stream has announced it
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// True once a name has been captured and it matches `name`
    pub fn is_call_to(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// The raw argument string accumulated so far
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    /// Best-effort parse of the (possibly incomplete) arguments string
    ///
    /// Used for `Start`-phase progress events. Parse failures yield an empty
    /// map, never an error: mid-accumulation the string is usually truncated
    /// JSON.
    pub fn partial_args(&self) -> Map<String, Value> {
        parse_object(&self.arguments).unwrap_or_default()
    }

    /// Final parse, performed once the upstream signals completion
    ///
    /// If the complete string still fails to parse, the tool is invoked with
    /// an empty argument set rather than aborting the turn.
    pub fn final_args(&self) -> Map<String, Value> {
        parse_object(&self.arguments).unwrap_or_else(|| {
            tracing::warn!(
                "Tool call arguments are not valid JSON, using empty args: {}",
                self.arguments
            );
            Map::new()
        })
    }

    /// Convert into the wire-format request record for the resume messages
    ///
    /// Returns `None` if no name was ever captured (nothing to execute). A
    /// missing id degrades to an empty string so the request/response pair
    /// still lines up.
    pub fn into_request(self) -> Option<ToolCallRequest> {
        let name = self.name?;
        Some(ToolCallRequest::new(
            self.id.unwrap_or_default(),
            name,
            self.arguments,
        ))
    }
}

fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    if raw.is_empty() {
        return Some(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::streaming::FunctionDelta;
    use proptest::prelude::*;

    fn delta(id: Option<&str>, name: Option<&str>, args: Option<&str>) -> ToolCallDelta {
        ToolCallDelta {
            id: id.map(String::from),
            function: Some(FunctionDelta {
                name: name.map(String::from),
                arguments: args.map(String::from),
            }),
        }
    }

    #[test]
    fn reconstructs_call_across_fragments() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&delta(Some("c1"), Some("query_video_transcription"), None));
        acc.observe(&delta(None, None, Some("{\"qu")));
        acc.observe(&delta(None, None, Some("ery\":\"AI\"}")));

        assert_eq!(acc.name(), Some("query_video_transcription"));
        assert_eq!(acc.arguments(), "{\"query\":\"AI\"}");
        assert_eq!(acc.final_args()["query"], "AI");

        let request = acc.into_request().unwrap();
        assert_eq!(request.id, "c1");
        assert_eq!(request.function.arguments, "{\"query\":\"AI\"}");
    }

    #[test]
    fn id_and_name_are_first_sighting_only() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&delta(Some("c1"), Some("first"), None));
        acc.observe(&delta(Some("c2"), Some("second"), None));

        assert_eq!(acc.name(), Some("first"));
        assert_eq!(acc.into_request().unwrap().id, "c1");
    }

    #[test]
    fn partial_args_never_fail() {
        let mut acc = ToolCallAccumulator::new();
        assert!(acc.partial_args().is_empty());

        acc.observe(&delta(None, Some("t"), Some("{\"query\":\"tru")));
        // Truncated JSON parses to nothing, not an error
        assert!(acc.partial_args().is_empty());

        acc.observe(&delta(None, None, Some("ncated\"}")));
        assert_eq!(acc.partial_args()["query"], "truncated");
    }

    #[test]
    fn invalid_final_args_yield_empty_map() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&delta(Some("c1"), Some("t"), Some("not json")));
        assert!(acc.final_args().is_empty());
        // The call is still executable
        assert!(acc.into_request().is_some());
    }

    #[test]
    fn non_object_json_yields_empty_map() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&delta(None, Some("t"), Some("[1,2,3]")));
        assert!(acc.final_args().is_empty());
    }

    #[test]
    fn no_name_means_nothing_to_execute() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&delta(Some("c1"), None, Some("{}")));
        assert!(acc.into_request().is_none());
    }

    #[test]
    fn missing_id_degrades_to_empty_string() {
        let mut acc = ToolCallAccumulator::new();
        acc.observe(&delta(None, Some("t"), Some("{}")));
        let request = acc.into_request().unwrap();
        assert_eq!(request.id, "");
    }

    proptest! {
        /// For any split of the arguments string into N >= 1 fragments, the
        /// reconstruction equals the concatenation in arrival order.
        #[test]
        fn fragment_splits_reassemble_exactly(
            args in "\\{\"query\":\"[a-zA-Z0-9 ]{0,40}\"\\}",
            cuts in proptest::collection::vec(0usize..64, 0..6),
        ) {
            let mut boundaries: Vec<usize> = cuts
                .into_iter()
                .map(|c| {
                    // Snap to char boundaries (ASCII here, but keep it safe)
                    let mut p = c % (args.len() + 1);
                    while !args.is_char_boundary(p) {
                        p -= 1;
                    }
                    p
                })
                .collect();
            boundaries.push(0);
            boundaries.push(args.len());
            boundaries.sort_unstable();
            boundaries.dedup();

            let mut acc = ToolCallAccumulator::new();
            acc.observe(&delta(Some("c1"), Some("t"), None));
            for window in boundaries.windows(2) {
                acc.observe(&delta(None, None, Some(&args[window[0]..window[1]])));
            }

            prop_assert_eq!(acc.arguments(), args.as_str());
            prop_assert!(acc.final_args().contains_key("query"));
        }
    }
}
