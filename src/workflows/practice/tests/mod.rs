mod checklist;
mod common;
mod voting;
