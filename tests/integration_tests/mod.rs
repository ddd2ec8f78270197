mod http;
mod query;
