//! Triton gRPC client implementing the pipeline's inference and readiness
//! capabilities.

use std::time::Duration;

use async_trait::async_trait;
use sentclass_core::{ClassifyError, ModelRef};
use sentclass_infer::{InferRequest, InferenceInvoker, RawOutput, Readiness};
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use crate::proto::{
    GrpcInferenceServiceClient, InferInputTensor, InferRequestedOutputTensor,
    ModelInferRequest, ModelInferResponse, ModelMetadataRequest, ModelMetadataResponse,
    ServerLiveRequest, ServerReadyRequest, TensorMetadata,
};

/// Per-call deadline used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("connection failed: {0}")]
    Connect(#[from] tonic::transport::Error),
    #[error("rpc failed: {0}")]
    Status(#[from] tonic::Status),
    #[error("server is not live")]
    NotLive,
    #[error("server is not ready")]
    NotReady,
}

impl From<ClientError> for ClassifyError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotReady | ClientError::NotLive => ClassifyError::NotReady,
            ClientError::Connect(_) => ClassifyError::Transport(err.to_string()),
            ClientError::Status(ref status) if is_transient(status.code()) => {
                ClassifyError::Transport(err.to_string())
            }
            ClientError::Status(_) | ClientError::InvalidEndpoint(_) => {
                ClassifyError::Rejected(err.to_string())
            }
        }
    }
}

/// Status codes that say the server could not answer right now, rather
/// than that it refused the request.
fn is_transient(code: tonic::Code) -> bool {
    matches!(
        code,
        tonic::Code::Unavailable | tonic::Code::DeadlineExceeded | tonic::Code::ResourceExhausted
    )
}

/// Connection settings for a Triton server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// gRPC endpoint, e.g. `http://localhost:8001`. A bare `host:port` is
    /// given an `http://` scheme.
    pub endpoint: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn uri(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{endpoint}")
        }
    }
}

/// gRPC client for a Triton inference server.
///
/// Cheap to clone; clones share the underlying channel.
#[derive(Debug, Clone)]
pub struct TritonClient {
    rpc: GrpcInferenceServiceClient,
    timeout: Duration,
}

impl TritonClient {
    /// Open a channel without probing the server.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let uri = config.uri();
        let endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|_| ClientError::InvalidEndpoint(config.endpoint.clone()))?
            .connect_timeout(config.timeout)
            .timeout(config.timeout);
        let channel: Channel = endpoint.connect().await?;
        info!(endpoint = %uri, "connected to inference server");
        Ok(Self {
            rpc: GrpcInferenceServiceClient::new(channel),
            timeout: config.timeout,
        })
    }

    /// Connect, require the server to be live and ready, and log the
    /// metadata of `model`.
    pub async fn connect_checked(
        config: &ClientConfig,
        model: &ModelRef,
    ) -> Result<Self, ClientError> {
        let client = Self::connect(config).await?;
        if !client.server_live().await? {
            return Err(ClientError::NotLive);
        }
        if !client.server_ready().await? {
            return Err(ClientError::NotReady);
        }
        let metadata = client.model_metadata(model).await?;
        info!(
            model = %metadata.name,
            versions = ?metadata.versions,
            platform = %metadata.platform,
            inputs = ?tensor_names(&metadata.inputs),
            outputs = ?tensor_names(&metadata.outputs),
            "loaded model metadata"
        );
        Ok(client)
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    pub async fn server_live(&self) -> Result<bool, ClientError> {
        let resp = self
            .rpc
            .clone()
            .server_live(self.request(ServerLiveRequest {}))
            .await?;
        Ok(resp.into_inner().live)
    }

    pub async fn server_ready(&self) -> Result<bool, ClientError> {
        let resp = self
            .rpc
            .clone()
            .server_ready(self.request(ServerReadyRequest {}))
            .await?;
        Ok(resp.into_inner().ready)
    }

    pub async fn model_metadata(
        &self,
        model: &ModelRef,
    ) -> Result<ModelMetadataResponse, ClientError> {
        let resp = self
            .rpc
            .clone()
            .model_metadata(self.request(ModelMetadataRequest {
                name: model.name.clone(),
                version: model.version.clone(),
            }))
            .await?;
        Ok(resp.into_inner())
    }

    pub async fn model_infer(&self, request: InferRequest) -> Result<Vec<RawOutput>, ClientError> {
        let model = request.model.name.clone();
        let message = build_infer_request(request);
        debug!(
            model = %model,
            bytes = message.raw_input_contents.iter().map(Vec::len).sum::<usize>(),
            "model infer"
        );
        let resp = self.rpc.clone().model_infer(self.request(message)).await?;
        Ok(raw_outputs(resp.into_inner()))
    }
}

#[async_trait]
impl InferenceInvoker for TritonClient {
    async fn infer(&self, request: InferRequest) -> Result<Vec<RawOutput>, ClassifyError> {
        Ok(self.model_infer(request).await?)
    }
}

#[async_trait]
impl Readiness for TritonClient {
    async fn live(&self) -> Result<bool, ClassifyError> {
        Ok(self.server_live().await?)
    }

    async fn ready(&self) -> Result<bool, ClassifyError> {
        Ok(self.server_ready().await?)
    }
}

fn build_infer_request(request: InferRequest) -> ModelInferRequest {
    let input = request.input;
    ModelInferRequest {
        model_name: request.model.name,
        model_version: request.model.version,
        id: String::new(),
        inputs: vec![InferInputTensor {
            name: input.name,
            datatype: input.datatype,
            shape: input.shape,
        }],
        outputs: request
            .outputs
            .into_iter()
            .map(|name| InferRequestedOutputTensor { name })
            .collect(),
        raw_input_contents: vec![input.data],
    }
}

/// Pair each output's metadata with its raw contents. Outputs without raw
/// contents are dropped and later reported as missing by the decoder.
fn raw_outputs(response: ModelInferResponse) -> Vec<RawOutput> {
    response
        .outputs
        .into_iter()
        .zip(response.raw_output_contents)
        .map(|(meta, contents)| RawOutput {
            name: meta.name,
            datatype: meta.datatype,
            shape: meta.shape,
            contents,
        })
        .collect()
}

fn tensor_names(tensors: &[TensorMetadata]) -> Vec<String> {
    tensors
        .iter()
        .map(|t| format!("{}:{}{:?}", t.name, t.datatype, t.shape))
        .collect()
}
