mod call_room_tests;
mod chat_room_tests;
mod handshake_tests;
