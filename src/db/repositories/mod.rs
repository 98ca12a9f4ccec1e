mod local_storage;
