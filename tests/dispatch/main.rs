mod attachments;
mod failures;
mod limits;
