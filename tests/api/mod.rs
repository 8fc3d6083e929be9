mod call_tests;
mod chat_tests;
mod health_tests;
