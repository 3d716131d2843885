//! SearchAgent tests (async driver, supersession, forwarding)

#![cfg(feature = "runtime")]

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use url::Url;
    use world_search::agent::{forward_scene_events, SceneEventReceiver, SearchAgent};
    use world_search::client::{SearchTransport, TransportError};
    use world_search::query::query_text;
    use world_search::{PromptResult, SceneCommand, SearchConfig, SearchError, SearchState};

    // -----------------------------------------------------------------------
    // Scripted transports
    // -----------------------------------------------------------------------

    /// Answers each query with a fixed body, immediately.
    struct FixedTransport {
        bodies: HashMap<String, Value>,
    }

    #[async_trait]
    impl SearchTransport for FixedTransport {
        async fn fetch(&self, uri: Url) -> Result<Value, TransportError> {
            let q = query_text(&uri).unwrap_or_default();
            match self.bodies.get(&q) {
                Some(body) => Ok(body.clone()),
                None => Err(TransportError::Timeout(Duration::from_secs(1))),
            }
        }
    }

    /// Holds each query's response until the test releases it.
    #[derive(Default)]
    struct GatedTransport {
        gates: Mutex<HashMap<String, oneshot::Receiver<Value>>>,
    }

    impl GatedTransport {
        fn gate(&self, query: &str) -> oneshot::Sender<Value> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(query.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl SearchTransport for GatedTransport {
        async fn fetch(&self, uri: Url) -> Result<Value, TransportError> {
            let q = query_text(&uri).unwrap_or_default();
            let rx = self.gates.lock().remove(&q);
            match rx {
                Some(rx) => rx
                    .await
                    .map_err(|_| TransportError::Timeout(Duration::from_secs(1))),
                None => std::future::pending().await,
            }
        }
    }

    fn config() -> SearchConfig {
        SearchConfig {
            spacing: 2.0,
            base_offset: 0.0,
            request_timeout_ms: 1_000,
            session: "test".into(),
            ..Default::default()
        }
    }

    fn spaces(ids: &[&str]) -> Value {
        let entries: Vec<Value> = ids
            .iter()
            .map(|id| json!({"space_id": id, "name": format!("World {}", id)}))
            .collect();
        json!({ "spaces": entries })
    }

    fn drain(rx: &mut SceneEventReceiver) -> Vec<(u64, SceneCommand)> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.session, "test");
            out.push((event.generation, event.payload));
        }
        out
    }

    fn placed(events: &[(u64, SceneCommand)]) -> Vec<(u64, String)> {
        events
            .iter()
            .filter_map(|(g, c)| match c {
                SceneCommand::PlaceTeleporter { world_id, .. } => Some((*g, world_id.clone())),
                _ => None,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Single search
    // -----------------------------------------------------------------------

    #[test]
    fn search_places_results() {
        tokio_test::block_on(async {
            let transport = FixedTransport {
                bodies: HashMap::from([(
                    "mankindforward".to_string(),
                    json!({"spaces": [{
                        "space_id": "abc",
                        "name": "Test World",
                        "favorited": 3,
                        "visited": 10,
                        "image_large": "http://x/y.png",
                        "first_name": "Jane",
                        "username": "jane1"
                    }]}),
                )]),
            };
            let (agent, mut rx) = SearchAgent::new(config(), transport);

            let summary = agent.search("mankindforward").await.unwrap();
            assert_eq!(summary.placed, 1);
            assert_eq!(agent.state(), SearchState::Populated { count: 1 });
            assert_eq!(agent.results().get("abc").unwrap().visit_count, 10);

            let events = drain(&mut rx);
            assert_eq!(placed(&events), [(1, "abc".to_string())]);
            assert!(events.iter().any(|(_, c)| matches!(
                c,
                SceneCommand::AttachPreviewImage { image_url, .. } if image_url == "http://x/y.png"
            )));
        });
    }

    #[test]
    fn not_found_reports_empty() {
        tokio_test::block_on(async {
            let transport = FixedTransport {
                bodies: HashMap::from([("zzz".to_string(), json!({"status": "404"}))]),
            };
            let (agent, mut rx) = SearchAgent::new(config(), transport);

            assert_eq!(agent.search("zzz").await, Err(SearchError::NotFound));
            assert_eq!(agent.state(), SearchState::Empty);
            assert!(placed(&drain(&mut rx)).is_empty());
        });
    }

    #[test]
    fn transport_error_becomes_invalid() {
        tokio_test::block_on(async {
            let transport = FixedTransport {
                bodies: HashMap::new(),
            };
            let (agent, _rx) = SearchAgent::new(config(), transport);

            let err = agent.search("anything").await.unwrap_err();
            assert!(matches!(err, SearchError::Invalid(_)));
            assert!(matches!(agent.state(), SearchState::Failed { .. }));
        });
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let (agent, _rx) = SearchAgent::new(
            SearchConfig {
                request_timeout_ms: 20,
                ..config()
            },
            GatedTransport::default(),
        );

        let err = agent.search("never").await.unwrap_err();
        match err {
            SearchError::Invalid(reason) => assert!(reason.contains("timed out"), "{}", reason),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // Supersession
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn later_search_wins_when_earlier_answers_last() {
        let transport = GatedTransport::default();
        let release_first = transport.gate("first");
        let release_second = transport.gate("second");
        let (agent, mut rx) = SearchAgent::new(config(), transport);

        let first = agent.spawn_search("first");
        let second = agent.spawn_search("second");

        release_second.send(spaces(&["new"])).unwrap();
        assert!(second.await.unwrap().is_ok());

        release_first.send(spaces(&["old"])).unwrap();
        assert_eq!(
            first.await.unwrap(),
            Err(SearchError::Superseded {
                generation: 1,
                latest: 2
            })
        );

        let events = drain(&mut rx);
        assert_eq!(placed(&events), [(2, "new".to_string())]);
        assert!(agent.results().get("old").is_none());
        assert_eq!(agent.stats().searches_superseded, 1);
    }

    #[tokio::test]
    async fn earlier_answer_is_ignored_while_later_is_pending() {
        let transport = GatedTransport::default();
        let release_first = transport.gate("first");
        let release_second = transport.gate("second");
        let (agent, mut rx) = SearchAgent::new(config(), transport);

        let first = agent.spawn_search("first");
        let second = agent.spawn_search("second");

        release_first.send(spaces(&["old"])).unwrap();
        assert!(matches!(
            first.await.unwrap(),
            Err(SearchError::Superseded { .. })
        ));
        assert_eq!(agent.state(), SearchState::Searching { generation: 2 });

        release_second.send(spaces(&["a", "b"])).unwrap();
        assert_eq!(second.await.unwrap().unwrap().placed, 2);

        let events = drain(&mut rx);
        assert_eq!(
            placed(&events),
            [(2, "a".to_string()), (2, "b".to_string())]
        );
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancelled_prompt_only_relabels() {
        let (agent, mut rx) = SearchAgent::new(config(), GatedTransport::default());

        assert!(agent.handle_prompt(&PromptResult::cancelled()).is_none());
        assert_eq!(agent.stats().searches_started, 0);
        assert_eq!(
            drain(&mut rx),
            [(
                0,
                SceneCommand::SetButtonLabel {
                    text: "Search\nLast: <cancelled>".into()
                }
            )]
        );
    }

    #[tokio::test]
    async fn submitted_prompt_relabels_then_searches() {
        let transport = FixedTransport {
            bodies: HashMap::from([("castle".to_string(), spaces(&["c1"]))]),
        };
        let (agent, mut rx) = SearchAgent::new(config(), transport);

        let handle = agent
            .handle_prompt(&PromptResult::submitted("castle"))
            .unwrap();
        handle.await.unwrap().unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            (
                1,
                SceneCommand::SetButtonLabel {
                    text: "Search\nLast: castle".into()
                }
            )
        );
        assert!(matches!(events[1], (1, SceneCommand::ShowStatus { .. })));
        assert_eq!(placed(&events), [(1, "c1".to_string())]);
    }

    #[tokio::test]
    async fn prompt_label_carries_the_search_it_starts() {
        let transport = GatedTransport::default();
        let _release_first = transport.gate("first");
        let _release_second = transport.gate("second");
        let (agent, mut rx) = SearchAgent::new(config(), transport);

        agent.handle_prompt(&PromptResult::submitted("first")).unwrap();
        agent.handle_prompt(&PromptResult::submitted("second")).unwrap();
        agent.handle_prompt(&PromptResult::cancelled());

        let labels: Vec<(u64, SceneCommand)> = drain(&mut rx)
            .into_iter()
            .filter(|(_, c)| matches!(c, SceneCommand::SetButtonLabel { .. }))
            .collect();
        assert_eq!(
            labels,
            [
                (
                    1,
                    SceneCommand::SetButtonLabel {
                        text: "Search\nLast: first".into()
                    }
                ),
                (
                    2,
                    SceneCommand::SetButtonLabel {
                        text: "Search\nLast: second".into()
                    }
                ),
                (
                    2,
                    SceneCommand::SetButtonLabel {
                        text: "Search\nLast: <cancelled>".into()
                    }
                ),
            ]
        );
        assert_eq!(agent.state(), SearchState::Searching { generation: 2 });
    }

    // -----------------------------------------------------------------------
    // Forwarding
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn forwarded_events_are_json_lines() {
        let transport = FixedTransport {
            bodies: HashMap::from([("q".to_string(), spaces(&["a"]))]),
        };
        let (agent, rx) = SearchAgent::new(config(), transport);
        agent.search("q").await.unwrap();
        drop(agent);

        let mut out = Vec::new();
        let written = forward_scene_events(rx, &mut out).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), written);

        let place = lines
            .iter()
            .find(|l| l["subject"] == "scene.teleporter.placed")
            .unwrap();
        assert_eq!(place["session"], "test");
        assert_eq!(place["generation"], 1);
        assert_eq!(place["payload"]["op"], "place_teleporter");
        assert_eq!(place["payload"]["world_id"], "a");
        assert_eq!(place["payload"]["position"]["x"], 2.0);
    }
}
