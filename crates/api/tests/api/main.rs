mod chat;
mod csv;
mod helpers;
mod predict;
