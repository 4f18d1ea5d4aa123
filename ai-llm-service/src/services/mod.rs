pub mod aws_sigv4;
pub mod bedrock_service;
pub mod ollama_service;
pub mod open_router_service;
pub mod openai_compat;
