//! Integration tests for [`handler_chain::HandlerChain`].
//!
//! Covers: before/after order, before stopping the chain, command handlers taking precedence
//! over the conversation handler, Ignore passing through, and error propagation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use dbot_core::{
    Chat, DbotError, Handler, HandlerError, HandlerResponse, Message, MessageDirection, User,
};
use handler_chain::HandlerChain;

fn create_test_message(content: &str) -> Message {
    Message {
        id: "test_message_id".to_string(),
        content: content.to_string(),
        user: User {
            id: 123,
            username: Some("test_user".to_string()),
            first_name: Some("Test".to_string()),
            last_name: None,
        },
        chat: Chat {
            id: 456,
            chat_type: "private".to_string(),
        },
        direction: MessageDirection::Incoming,
        created_at: Utc::now(),
        reply_to_message_id: None,
        reply_to_message_from_bot: false,
        mentions_bot: false,
        thread_id: None,
        topic_name: None,
    }
}

/// Replies to messages starting with its command, ignores the rest.
struct CommandHandler {
    command: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Handler for CommandHandler {
    async fn handle(&self, message: &Message) -> dbot_core::Result<HandlerResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if message.content.starts_with(self.command) {
            Ok(HandlerResponse::Reply(format!("ran {}", self.command)))
        } else {
            Ok(HandlerResponse::Ignore)
        }
    }
}

/// Answers every message by echoing it.
struct ConversationHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Handler for ConversationHandler {
    async fn handle(&self, message: &Message) -> dbot_core::Result<HandlerResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerResponse::Reply(message.content.clone()))
    }
}

/// **Test: A matching command handler answers; the conversation handler is not run.**
#[tokio::test]
async fn test_command_takes_precedence() {
    let command_calls = Arc::new(AtomicUsize::new(0));
    let conversation_calls = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(CommandHandler {
            command: "/context_stats",
            calls: command_calls.clone(),
        }))
        .add_handler(Arc::new(ConversationHandler {
            calls: conversation_calls.clone(),
        }));

    let result = chain
        .handle(&create_test_message("/context_stats"))
        .await
        .unwrap();

    assert_eq!(result, HandlerResponse::Reply("ran /context_stats".to_string()));
    assert_eq!(command_calls.load(Ordering::SeqCst), 1);
    assert_eq!(conversation_calls.load(Ordering::SeqCst), 0);
}

/// **Test: Ignore passes the message to the next handler.**
#[tokio::test]
async fn test_ignore_falls_through() {
    let conversation_calls = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(CommandHandler {
            command: "/clear_context",
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .add_handler(Arc::new(ConversationHandler {
            calls: conversation_calls.clone(),
        }));

    let result = chain
        .handle(&create_test_message("who knows Rust?"))
        .await
        .unwrap();

    assert_eq!(result, HandlerResponse::Reply("who knows Rust?".to_string()));
    assert_eq!(conversation_calls.load(Ordering::SeqCst), 1);
}

/// **Test: Empty chain returns Continue.**
#[tokio::test]
async fn test_empty_chain_continues() {
    let chain = HandlerChain::new();
    assert!(chain.is_empty());
    let result = chain.handle(&create_test_message("hi")).await.unwrap();
    assert_eq!(result, HandlerResponse::Continue);
}

/// **Test: Handler before returns false stops the chain; handle is not run.**
#[tokio::test]
async fn test_before_false_stops_chain() {
    struct BlockingHandler;

    #[async_trait::async_trait]
    impl Handler for BlockingHandler {
        async fn before(&self, _message: &Message) -> dbot_core::Result<bool> {
            Ok(false)
        }
    }

    let conversation_calls = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(BlockingHandler))
        .add_handler(Arc::new(ConversationHandler {
            calls: conversation_calls.clone(),
        }));

    let result = chain.handle(&create_test_message("test")).await.unwrap();

    assert_eq!(result, HandlerResponse::Stop);
    assert_eq!(conversation_calls.load(Ordering::SeqCst), 0);
}

/// **Test: The final Reply is passed to every after().**
#[tokio::test]
async fn test_reply_passed_to_after() {
    struct CaptureResponse {
        seen: Arc<Mutex<Vec<HandlerResponse>>>,
    }

    #[async_trait::async_trait]
    impl Handler for CaptureResponse {
        async fn after(
            &self,
            _message: &Message,
            response: &HandlerResponse,
        ) -> dbot_core::Result<()> {
            self.seen.lock().unwrap().push(response.clone());
            Ok(())
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(CaptureResponse { seen: seen.clone() }))
        .add_handler(Arc::new(ConversationHandler {
            calls: Arc::new(AtomicUsize::new(0)),
        }));

    chain.handle(&create_test_message("hello")).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![HandlerResponse::Reply("hello".to_string())]
    );
}

/// **Test: before runs first→last, after runs last→first.**
#[tokio::test]
async fn test_multiple_handlers_executed_in_order() {
    struct OrderHandler {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Handler for OrderHandler {
        async fn before(&self, _message: &Message) -> dbot_core::Result<bool> {
            self.order.lock().unwrap().push(format!("before_{}", self.name));
            Ok(true)
        }

        async fn after(
            &self,
            _message: &Message,
            _response: &HandlerResponse,
        ) -> dbot_core::Result<()> {
            self.order.lock().unwrap().push(format!("after_{}", self.name));
            Ok(())
        }
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(OrderHandler {
            name: "first",
            order: order.clone(),
        }))
        .add_handler(Arc::new(OrderHandler {
            name: "second",
            order: order.clone(),
        }));

    chain.handle(&create_test_message("test")).await.unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["before_first", "before_second", "after_second", "after_first"]
    );
}

/// **Test: A handler error aborts the chain and is returned to the caller.**
#[tokio::test]
async fn test_handler_error_propagates() {
    struct FailingHandler;

    #[async_trait::async_trait]
    impl Handler for FailingHandler {
        async fn handle(&self, _message: &Message) -> dbot_core::Result<HandlerResponse> {
            Err(HandlerError::Unauthorized.into())
        }
    }

    let conversation_calls = Arc::new(AtomicUsize::new(0));
    let chain = HandlerChain::new()
        .add_handler(Arc::new(FailingHandler))
        .add_handler(Arc::new(ConversationHandler {
            calls: conversation_calls.clone(),
        }));

    let err = chain.handle(&create_test_message("x")).await.unwrap_err();

    assert!(matches!(err, DbotError::Handler(HandlerError::Unauthorized)));
    assert_eq!(conversation_calls.load(Ordering::SeqCst), 0);
}
