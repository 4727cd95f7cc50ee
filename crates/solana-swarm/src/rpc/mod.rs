pub mod mcp_server;
