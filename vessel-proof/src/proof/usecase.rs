use rst_common::with_logging::log::debug;

use crate::command::types::FromReply;
use crate::command::{Correlator, PendingResult};

use super::types::{
    Acknowledgement, Command, ConnectionHandle, EngineBuilder, GetProofResult, ProofAPI,
    ProofError, ProofHandle, ProofState, Request, SerializedProof, UsecaseBuilder,
};

fn required(value: &str, field: &str) -> Result<(), ProofError> {
    if value.is_empty() {
        return Err(ProofError::ValidationError(format!("{field} was missing")));
    }

    Ok(())
}

fn required_handle(value: u32, field: &str) -> Result<(), ProofError> {
    if value == 0 {
        return Err(ProofError::ValidationError(format!("{field} was missing")));
    }

    Ok(())
}

#[derive(Clone)]
pub struct Usecase<TEngine>
where
    TEngine: EngineBuilder,
{
    engine: TEngine,
    correlator: Correlator,
}

impl<TEngine> Usecase<TEngine>
where
    TEngine: EngineBuilder,
{
    pub fn new(engine: TEngine, correlator: Correlator) -> Self {
        Self { engine, correlator }
    }

    fn submit<T>(&self, command: Command) -> Result<PendingResult<T>, ProofError>
    where
        T: FromReply<Error = ProofError>,
    {
        let engine = self.engine();
        let op_code = command.op_code();

        let pending = self.correlator().submit(move |command_handle| {
            debug!("[proof:{op_code}] dispatching command: {command_handle}");
            engine.dispatch(Request::new(command_handle, command))
        })?;

        Ok(pending)
    }
}

impl<TEngine> UsecaseBuilder for Usecase<TEngine>
where
    TEngine: EngineBuilder,
{
    type EngineImplementer = TEngine;

    fn engine(&self) -> Self::EngineImplementer {
        self.engine.to_owned()
    }

    fn correlator(&self) -> Correlator {
        self.correlator.to_owned()
    }
}

impl<TEngine> ProofAPI for Usecase<TEngine>
where
    TEngine: EngineBuilder,
{
    fn create(
        &self,
        source_id: String,
        requested_attrs: String,
        requested_predicates: String,
        name: String,
    ) -> Result<PendingResult<ProofHandle>, ProofError> {
        required(&source_id, "source_id")?;
        required(&requested_attrs, "requested_attrs")?;
        required(&requested_predicates, "requested_predicates")?;
        required(&name, "name")?;

        self.submit(Command::CreateProof {
            source_id,
            requested_attrs,
            requested_predicates,
            name,
        })
    }

    fn send_request(
        &self,
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    ) -> Result<PendingResult<Acknowledgement>, ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;
        required_handle(connection_handle.value(), "connection_handle")?;

        self.submit(Command::SendRequest {
            proof_handle,
            connection_handle,
        })
    }

    fn get_proof(
        &self,
        proof_handle: ProofHandle,
        connection_handle: ConnectionHandle,
    ) -> Result<PendingResult<GetProofResult>, ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;
        required_handle(connection_handle.value(), "connection_handle")?;

        self.submit(Command::GetProof {
            proof_handle,
            connection_handle,
        })
    }

    fn accepted(&self, proof_handle: ProofHandle, response_data: String) -> Result<(), ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;
        required(&response_data, "response_data")?;

        self.engine()
            .proof_accepted(proof_handle, response_data)
            .map_err(ProofError::SubmissionError)
    }

    fn update_state(
        &self,
        proof_handle: ProofHandle,
    ) -> Result<PendingResult<ProofState>, ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;
        self.submit(Command::UpdateState { proof_handle })
    }

    fn get_state(&self, proof_handle: ProofHandle) -> Result<PendingResult<ProofState>, ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;
        self.submit(Command::GetState { proof_handle })
    }

    fn serialize(
        &self,
        proof_handle: ProofHandle,
    ) -> Result<PendingResult<SerializedProof>, ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;
        self.submit(Command::Serialize { proof_handle })
    }

    fn deserialize(
        &self,
        serialized_proof: SerializedProof,
    ) -> Result<PendingResult<ProofHandle>, ProofError> {
        required(serialized_proof.as_str(), "serialized_proof")?;
        self.submit(Command::Deserialize { serialized_proof })
    }

    fn release(&self, proof_handle: ProofHandle) -> Result<(), ProofError> {
        required_handle(proof_handle.value(), "proof_handle")?;

        self.engine()
            .proof_release(proof_handle)
            .map_err(ProofError::SubmissionError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    use std::thread;

    use rst_common::with_tokio::tokio;

    use crate::command::types::{ErrorCode, ReplyPayload, Resolution};
    use crate::proof::types::{VerificationState, STATE_REQUEST_SENT, VERIFICATION_VALIDATED};

    mock!(
        FakeEngine{}

        impl Clone for FakeEngine {
            fn clone(&self) -> Self;
        }

        impl EngineBuilder for FakeEngine {
            fn dispatch(&self, request: Request) -> Result<(), ErrorCode>;

            fn proof_accepted(
                &self,
                proof_handle: ProofHandle,
                response_data: String,
            ) -> Result<(), ErrorCode>;

            fn proof_release(&self, proof_handle: ProofHandle) -> Result<(), ErrorCode>;
        }
    );

    fn generate_usecase<TEngine: EngineBuilder>(
        engine: TEngine,
        correlator: Correlator,
    ) -> Usecase<TEngine> {
        Usecase::new(engine, correlator)
    }

    // an engine whose every dispatch is answered from its own thread with the given payload
    fn replying_engine(correlator: &Correlator, payload: ReplyPayload) -> MockFakeEngine {
        let notifier = correlator.notifier();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected.expect_dispatch().times(1).returning(move |request| {
                let notifier = notifier.clone();
                let payload = payload.clone();
                thread::spawn(move || {
                    notifier.complete(request.get_command_handle(), payload);
                });
                Ok(())
            });

            expected
        });

        engine
    }

    #[tokio::test]
    async fn test_create() {
        let correlator = Correlator::new();
        let notifier = correlator.notifier();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_dispatch()
                .withf(|request| {
                    matches!(
                        request.get_command(),
                        Command::CreateProof { source_id, name, .. }
                            if source_id == "src1" && name == "name"
                    )
                })
                .times(1)
                .returning(move |request| {
                    notifier.complete(request.get_command_handle(), ReplyPayload::Integer(1));
                    Ok(())
                });

            expected
        });

        let uc = generate_usecase(engine, correlator.clone());
        let pending = uc.create(
            "src1".to_string(),
            "{}".to_string(),
            "{}".to_string(),
            "name".to_string(),
        );
        assert!(!pending.is_err());

        let output = pending.unwrap().await;
        assert_eq!(output, Ok(ProofHandle::from(1)));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_create_validation_error() {
        let table = vec![
            ("", "{}", "{}", "name", "source_id"),
            ("src1", "", "{}", "name", "requested_attrs"),
            ("src1", "{}", "", "name", "requested_predicates"),
            ("src1", "{}", "{}", "", "name"),
        ];

        for (source_id, attrs, predicates, name, field) in table {
            let correlator = Correlator::new();
            let engine = MockFakeEngine::new();
            let uc = generate_usecase(engine, correlator.clone());

            let output = uc.create(
                source_id.to_string(),
                attrs.to_string(),
                predicates.to_string(),
                name.to_string(),
            );
            assert!(output.is_err());

            let output_err = output.err().unwrap();
            assert!(matches!(output_err, ProofError::ValidationError(_)));
            assert!(output_err.to_string().contains(field));
            assert_eq!(correlator.pending_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_create_engine_error() {
        let correlator = Correlator::new();
        let notifier = correlator.notifier();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected.expect_dispatch().times(1).returning(move |request| {
                notifier.fail(request.get_command_handle(), ErrorCode::from(1016));
                Ok(())
            });

            expected
        });

        let uc = generate_usecase(engine, correlator);
        let output = uc
            .create(
                "src1".to_string(),
                "not-json".to_string(),
                "{}".to_string(),
                "name".to_string(),
            )
            .unwrap()
            .await;

        assert_eq!(output, Err(ProofError::EngineError(ErrorCode::from(1016))));
    }

    #[tokio::test]
    async fn test_send_request() {
        let correlator = Correlator::new();
        let engine = replying_engine(&correlator, ReplyPayload::Empty);

        let uc = generate_usecase(engine, correlator.clone());
        let pending = uc
            .send_request(ProofHandle::from(1), ConnectionHandle::from(2))
            .unwrap();
        let command_handle = pending.command_handle();

        let ack = pending.await;
        assert!(!ack.is_err());
        assert_eq!(ack.unwrap().get_command_handle(), command_handle);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_send_request_submission_error() {
        let correlator = Correlator::new();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_dispatch()
                .times(1)
                .returning(|_| Err(ErrorCode::from(1017)));

            expected
        });

        let uc = generate_usecase(engine, correlator.clone());
        let output = uc.send_request(ProofHandle::from(77), ConnectionHandle::from(1));
        assert!(output.is_err());
        assert_eq!(
            output.err(),
            Some(ProofError::SubmissionError(ErrorCode::from(1017)))
        );
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_send_request_validation_error() {
        let correlator = Correlator::new();
        let engine = MockFakeEngine::new();
        let uc = generate_usecase(engine, correlator);

        let output = uc.send_request(ProofHandle::from(0), ConnectionHandle::from(1));
        let output_err = output.err().unwrap();
        assert!(output_err.to_string().contains("proof_handle"));

        let output = uc.send_request(ProofHandle::from(1), ConnectionHandle::from(0));
        let output_err = output.err().unwrap();
        assert!(output_err.to_string().contains("connection_handle"));
    }

    #[tokio::test]
    async fn test_get_proof() {
        let correlator = Correlator::new();
        let engine = replying_engine(
            &correlator,
            ReplyPayload::IntegerText(VERIFICATION_VALIDATED, r#"{"proof":{}}"#.to_string()),
        );

        let uc = generate_usecase(engine, correlator);
        let output = uc
            .get_proof(ProofHandle::from(1), ConnectionHandle::from(2))
            .unwrap()
            .await;
        assert!(!output.is_err());

        let result = output.unwrap();
        assert_eq!(result.get_proof_state(), VerificationState::Validated);
        assert_eq!(result.get_response_data(), r#"{"proof":{}}"#);
    }

    #[tokio::test]
    async fn test_get_proof_unknown_verification_state() {
        let correlator = Correlator::new();
        let engine = replying_engine(&correlator, ReplyPayload::IntegerText(42, "{}".to_string()));

        let uc = generate_usecase(engine, correlator);
        let output = uc
            .get_proof(ProofHandle::from(1), ConnectionHandle::from(2))
            .unwrap()
            .await;
        assert_eq!(output, Err(ProofError::UnknownVerificationState(42)));
    }

    #[test]
    fn test_accepted() {
        let correlator = Correlator::new();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_proof_accepted()
                .with(eq(ProofHandle::from(3)), eq("{}".to_string()))
                .times(1)
                .returning(|_, _| Ok(()));
            expected.expect_dispatch().never();

            expected
        });

        let uc = generate_usecase(engine, correlator.clone());
        let output = uc.accepted(ProofHandle::from(3), "{}".to_string());
        assert!(!output.is_err());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_accepted_engine_rejects() {
        let correlator = Correlator::new();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_proof_accepted()
                .times(1)
                .returning(|_, _| Err(ErrorCode::from(1005)));

            expected
        });

        let uc = generate_usecase(engine, correlator.clone());
        let output = uc.accepted(ProofHandle::from(3), "{}".to_string());
        assert_eq!(
            output,
            Err(ProofError::SubmissionError(ErrorCode::from(1005)))
        );
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_accepted_validation_error() {
        let engine = MockFakeEngine::new();
        let uc = generate_usecase(engine, Correlator::new());

        let output = uc.accepted(ProofHandle::from(3), "".to_string());
        assert!(output.is_err());
        assert!(output.unwrap_err().to_string().contains("response_data"));
    }

    #[tokio::test]
    async fn test_update_state() {
        let correlator = Correlator::new();
        let engine = replying_engine(&correlator, ReplyPayload::Integer(STATE_REQUEST_SENT));

        let uc = generate_usecase(engine, correlator);
        let output = uc.update_state(ProofHandle::from(1)).unwrap().await;
        assert_eq!(output, Ok(ProofState::RequestSent));
    }

    #[tokio::test]
    async fn test_update_state_unknown_code() {
        let correlator = Correlator::new();
        let engine = replying_engine(&correlator, ReplyPayload::Integer(77));

        let uc = generate_usecase(engine, correlator);
        let output = uc.update_state(ProofHandle::from(1)).unwrap().await;
        assert_eq!(output, Err(ProofError::UnknownState(77)));
    }

    #[tokio::test]
    async fn test_get_state() {
        let correlator = Correlator::new();
        let engine = replying_engine(&correlator, ReplyPayload::Integer(STATE_REQUEST_SENT));

        let uc = generate_usecase(engine, correlator);
        let output = uc.get_state(ProofHandle::from(1)).unwrap().await;
        assert_eq!(output, Ok(ProofState::RequestSent));
    }

    #[tokio::test]
    async fn test_serialize() {
        let correlator = Correlator::new();
        let engine = replying_engine(&correlator, ReplyPayload::Text("opaque".to_string()));

        let uc = generate_usecase(engine, correlator);
        let output = uc.serialize(ProofHandle::from(1)).unwrap().await;
        assert_eq!(output, Ok(SerializedProof::from("opaque".to_string())));
    }

    #[tokio::test]
    async fn test_deserialize() {
        let correlator = Correlator::new();
        let notifier = correlator.notifier();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_dispatch()
                .withf(|request| {
                    matches!(
                        request.get_command(),
                        Command::Deserialize { serialized_proof } if serialized_proof.as_str() == "opaque"
                    )
                })
                .times(1)
                .returning(move |request| {
                    notifier.complete(request.get_command_handle(), ReplyPayload::Integer(9));
                    Ok(())
                });

            expected
        });

        let uc = generate_usecase(engine, correlator);
        let output = uc
            .deserialize(SerializedProof::from("opaque".to_string()))
            .unwrap()
            .await;
        assert_eq!(output, Ok(ProofHandle::from(9)));
    }

    #[test]
    fn test_deserialize_validation_error() {
        let engine = MockFakeEngine::new();
        let uc = generate_usecase(engine, Correlator::new());

        let output = uc.deserialize(SerializedProof::from("".to_string()));
        assert!(output.is_err());
        assert!(matches!(
            output.err(),
            Some(ProofError::ValidationError(msg)) if msg.contains("serialized_proof")
        ));
    }

    #[test]
    fn test_release() {
        let correlator = Correlator::new();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(2).returning(|| {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_proof_release()
                .with(eq(ProofHandle::from(5)))
                .times(1)
                .returning(|_| Ok(()));

            expected
        });

        let uc = generate_usecase(engine, correlator.clone());
        assert!(!uc.release(ProofHandle::from(5)).is_err());
        assert!(!uc.release(ProofHandle::from(5)).is_err());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_release_unknown_handle() {
        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(|| {
            let mut expected = MockFakeEngine::new();
            expected
                .expect_proof_release()
                .returning(|_| Err(ErrorCode::from(1017)));

            expected
        });

        let uc = generate_usecase(engine, Correlator::new());
        let output = uc.release(ProofHandle::from(404));
        assert_eq!(
            output,
            Err(ProofError::SubmissionError(ErrorCode::from(1017)))
        );
    }

    #[tokio::test]
    async fn test_duplicate_reply_never_reaches_caller() {
        let correlator = Correlator::new();
        let notifier = correlator.notifier();
        let duplicate_notifier = correlator.notifier();

        let mut engine = MockFakeEngine::new();
        engine.expect_clone().times(1).return_once(move || {
            let mut expected = MockFakeEngine::new();
            expected.expect_dispatch().times(1).returning(move |request| {
                let handle = request.get_command_handle();
                notifier.complete(handle, ReplyPayload::Integer(STATE_REQUEST_SENT));
                Ok(())
            });

            expected
        });

        let uc = generate_usecase(engine, correlator.clone());
        let pending = uc.get_state(ProofHandle::from(1)).unwrap();
        let handle = pending.command_handle();

        assert_eq!(
            duplicate_notifier.complete(handle, ReplyPayload::Integer(9)),
            Resolution::Dropped
        );
        assert_eq!(
            duplicate_notifier.complete(handle, ReplyPayload::Integer(9)),
            Resolution::Dropped
        );

        assert_eq!(pending.await, Ok(ProofState::RequestSent));
        assert_eq!(correlator.pending_count(), 0);
    }
}
