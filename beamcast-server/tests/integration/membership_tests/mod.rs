mod test_duplicate_viewers_collapse;
mod test_host_cannot_view_itself;
