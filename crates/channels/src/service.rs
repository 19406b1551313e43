//! Channel lifecycle operations.

use std::{collections::BTreeSet, sync::Arc};

use tracing::{debug, warn};

use {
    wheelhouse_identity::{Subject, SubjectStore},
    wheelhouse_media::ContentStore,
};

use crate::{
    error::{Error, Result},
    model::{self, Channel, CreateChannel, EditChannel},
    store::ChannelStore,
    view::{ChannelSummary, ChannelView, SubjectView},
};

/// Channel operations on top of the store, the subject directory, and the
/// content store. Callers identify the acting subject explicitly; the
/// service itself knows nothing about tokens.
pub struct ChannelService {
    channels: Arc<dyn ChannelStore>,
    subjects: Arc<dyn SubjectStore>,
    content: Arc<dyn ContentStore>,
}

impl ChannelService {
    pub fn new(
        channels: Arc<dyn ChannelStore>,
        subjects: Arc<dyn SubjectStore>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            channels,
            subjects,
            content,
        }
    }

    /// Create a channel on behalf of `creator_id`. The creator is always
    /// enrolled, whether or not the request listed them; requested member
    /// ids that match no subject are dropped.
    pub async fn create(&self, creator_id: &str, payload: CreateChannel) -> Result<ChannelView> {
        model::validate_name(&payload.name)?;

        let creator = self.load_subject(creator_id).await?;
        let members = self.resolve_members(&payload.member_ids).await?;

        let image_ref = match payload.image {
            Some(image) => Some(self.content.store(&image.bytes, &image.content_type).await?),
            None => None,
        };

        let channel = Channel::new(
            payload.name,
            payload.description,
            image_ref,
            creator.id,
            members.iter().map(|m| m.id.clone()),
        );
        if let Err(e) = self.channels.insert(&channel).await {
            // The image never became reachable; drop it again.
            self.discard_image(channel.image_ref.as_deref()).await;
            return Err(Error::store("insert channel", e));
        }
        debug!(channel_id = %channel.id, members = channel.members.len(), "channel created");

        self.project(channel).await
    }

    /// Apply a partial edit. Absent fields keep their current values, and
    /// the member set is never touched. A replaced image is removed from
    /// the content store once the edit has been persisted.
    pub async fn edit(&self, channel_id: &str, payload: EditChannel) -> Result<ChannelView> {
        // Name policy is checked before anything is loaded or written.
        if let Some(name) = &payload.name {
            model::validate_name(name)?;
        }

        let mut channel = self.load_channel(channel_id).await?;

        if let Some(name) = payload.name {
            channel.name = name;
        }
        if let Some(description) = payload.description {
            channel.description = Some(description);
        }

        let mut stored_ref = None;
        let mut replaced_ref = None;
        if let Some(image) = payload.image {
            let reference = self.content.store(&image.bytes, &image.content_type).await?;
            replaced_ref = channel.image_ref.replace(reference.clone());
            stored_ref = Some(reference);
        }

        if let Err(e) = self.channels.update(&channel).await {
            self.discard_image(stored_ref.as_deref()).await;
            return Err(Error::store("update channel", e));
        }
        self.discard_image(replaced_ref.as_deref()).await;
        debug!(channel_id = %channel.id, "channel updated");

        self.project(channel).await
    }

    /// Delete a channel and, best-effort, its stored image.
    pub async fn delete(&self, channel_id: &str) -> Result<()> {
        let channel = self.load_channel(channel_id).await?;
        let removed = self
            .channels
            .delete(&channel.id)
            .await
            .map_err(|e| Error::store("delete channel", e))?;
        if !removed {
            return Err(Error::unknown_channel(channel_id));
        }
        self.discard_image(channel.image_ref.as_deref()).await;
        debug!(channel_id = %channel.id, "channel deleted");
        Ok(())
    }

    /// Full projection of one channel.
    pub async fn get(&self, channel_id: &str) -> Result<ChannelView> {
        let channel = self.load_channel(channel_id).await?;
        self.project(channel).await
    }

    /// Channels the subject is a member of, as compact summaries. A subject
    /// with no memberships gets an empty list.
    pub async fn list_for_subject(&self, subject_id: &str) -> Result<Vec<ChannelSummary>> {
        let channels = self
            .channels
            .list_for_member(subject_id)
            .await
            .map_err(|e| Error::store("list channels", e))?;
        Ok(channels.iter().map(ChannelSummary::from).collect())
    }

    async fn load_channel(&self, channel_id: &str) -> Result<Channel> {
        self.channels
            .get(channel_id)
            .await
            .map_err(|e| Error::store("load channel", e))?
            .ok_or_else(|| Error::unknown_channel(channel_id))
    }

    async fn load_subject(&self, subject_id: &str) -> Result<Subject> {
        self.subjects
            .get(subject_id)
            .await
            .map_err(|e| Error::store("load subject", e))?
            .ok_or_else(|| Error::unknown_subject(subject_id))
    }

    /// Resolve requested member ids, silently dropping unknown ones.
    async fn resolve_members(&self, member_ids: &[String]) -> Result<Vec<Subject>> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }
        let found = self
            .subjects
            .get_many(member_ids)
            .await
            .map_err(|e| Error::store("load members", e))?;
        let requested: BTreeSet<&String> = member_ids.iter().collect();
        if found.len() < requested.len() {
            debug!(
                requested = requested.len(),
                found = found.len(),
                "dropping unknown member ids"
            );
        }
        Ok(found)
    }

    /// Resolve the member set to profiles. Ids with no matching subject are
    /// skipped rather than failing the view.
    async fn project(&self, channel: Channel) -> Result<ChannelView> {
        let ids: Vec<String> = channel.members.iter().cloned().collect();
        let subjects = self
            .subjects
            .get_many(&ids)
            .await
            .map_err(|e| Error::store("load members", e))?;
        let members = subjects.iter().map(SubjectView::from).collect();
        Ok(ChannelView::assemble(channel, members))
    }

    /// Best-effort removal of a stored image. Failures are logged, never
    /// propagated.
    async fn discard_image(&self, reference: Option<&str>) {
        let Some(reference) = reference else { return };
        if let Err(e) = self.content.delete(reference).await {
            warn!(reference, error = %e, "failed to remove channel image");
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use wheelhouse_media::{ALLOWED_IMAGE_TYPES, StoredContent};

    use super::*;
    use crate::model::ImageUpload;

    #[derive(Default)]
    struct MemChannelStore {
        channels: Mutex<HashMap<String, Channel>>,
        gets: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ChannelStore for MemChannelStore {
        async fn insert(&self, channel: &Channel) -> anyhow::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.channels
                .lock()
                .unwrap()
                .insert(channel.id.clone(), channel.clone());
            Ok(())
        }

        async fn update(&self, channel: &Channel) -> anyhow::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.channels
                .lock()
                .unwrap()
                .insert(channel.id.clone(), channel.clone());
            Ok(())
        }

        async fn delete(&self, id: &str) -> anyhow::Result<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(self.channels.lock().unwrap().remove(id).is_some())
        }

        async fn get(&self, id: &str) -> anyhow::Result<Option<Channel>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(self.channels.lock().unwrap().get(id).cloned())
        }

        async fn list_for_member(&self, subject_id: &str) -> anyhow::Result<Vec<Channel>> {
            let mut found: Vec<Channel> = self
                .channels
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.members.contains(subject_id))
                .cloned()
                .collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            Ok(found)
        }
    }

    #[derive(Default)]
    struct MemSubjectStore {
        subjects: Mutex<HashMap<String, Subject>>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SubjectStore for MemSubjectStore {
        async fn insert(&self, subject: &Subject) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.subjects
                .lock()
                .unwrap()
                .insert(subject.id.clone(), subject.clone());
            Ok(())
        }

        async fn get(&self, id: &str) -> anyhow::Result<Option<Subject>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.subjects.lock().unwrap().get(id).cloned())
        }

        async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Subject>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .subjects
                .lock()
                .unwrap()
                .values()
                .find(|s| s.email == email)
                .cloned())
        }

        async fn get_many(&self, ids: &[String]) -> anyhow::Result<Vec<Subject>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let subjects = self.subjects.lock().unwrap();
            Ok(ids.iter().filter_map(|id| subjects.get(id).cloned()).collect())
        }

        async fn list(&self) -> anyhow::Result<Vec<Subject>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.subjects.lock().unwrap().values().cloned().collect())
        }

        async fn count(&self) -> anyhow::Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.subjects.lock().unwrap().len() as i64)
        }

        async fn set_active(&self, id: &str, active: bool) -> anyhow::Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.subjects.lock().unwrap().get_mut(id) {
                Some(s) => {
                    s.active = active;
                    Ok(true)
                },
                None => Ok(false),
            }
        }
    }

    #[derive(Default)]
    struct MemContentStore {
        stored: Mutex<HashMap<String, Vec<u8>>>,
        stores: AtomicUsize,
        deletes: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl ContentStore for MemContentStore {
        async fn store(
            &self,
            data: &[u8],
            content_type: &str,
        ) -> wheelhouse_media::Result<String> {
            if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
                return Err(wheelhouse_media::Error::unsupported_type(content_type));
            }
            let n = self.stores.fetch_add(1, Ordering::SeqCst) + 1;
            let reference = format!("img-{n}.png");
            self.stored
                .lock()
                .unwrap()
                .insert(reference.clone(), data.to_vec());
            Ok(reference)
        }

        async fn open(&self, reference: &str) -> wheelhouse_media::Result<StoredContent> {
            match self.stored.lock().unwrap().get(reference) {
                Some(data) => Ok(StoredContent {
                    data: data.clone(),
                    content_type: "image/png".into(),
                }),
                None => Err(wheelhouse_media::Error::not_found(reference)),
            }
        }

        async fn delete(&self, reference: &str) -> wheelhouse_media::Result<()> {
            self.deletes.lock().unwrap().push(reference.to_string());
            self.stored.lock().unwrap().remove(reference);
            Ok(())
        }
    }

    struct Fixture {
        service: ChannelService,
        channels: Arc<MemChannelStore>,
        subjects: Arc<MemSubjectStore>,
        content: Arc<MemContentStore>,
    }

    fn fixture() -> Fixture {
        let channels = Arc::new(MemChannelStore::default());
        let subjects = Arc::new(MemSubjectStore::default());
        let content = Arc::new(MemContentStore::default());
        let service = ChannelService::new(channels.clone(), subjects.clone(), content.clone());
        Fixture {
            service,
            channels,
            subjects,
            content,
        }
    }

    fn subject(id: &str, name: &str, surname: &str) -> Subject {
        Subject {
            id: id.into(),
            name: name.into(),
            surname: surname.into(),
            email: format!("{id}@example.com"),
            phone: None,
            password_hash: "phc".into(),
            active: true,
            created_at: 0,
        }
    }

    impl Fixture {
        fn seed(&self, entries: &[Subject]) {
            let mut map = self.subjects.subjects.lock().unwrap();
            for entry in entries {
                map.insert(entry.id.clone(), entry.clone());
            }
        }
    }

    fn create_payload(name: &str, member_ids: &[&str]) -> CreateChannel {
        CreateChannel {
            name: name.into(),
            description: None,
            member_ids: member_ids.iter().map(|m| m.to_string()).collect(),
            image: None,
        }
    }

    fn png_upload() -> ImageUpload {
        ImageUpload {
            bytes: vec![1, 2, 3],
            content_type: "image/png".into(),
        }
    }

    #[tokio::test]
    async fn create_enrolls_creator_exactly_once() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames"), subject("b", "Bo", "Berg")]);

        // The creator appears in the requested list as well.
        let view = fx
            .service
            .create("a", create_payload("driving-101", &["a", "b"]))
            .await
            .unwrap();

        assert_eq!(view.members.len(), 2);
        assert_eq!(view.creator_id, "a");
        assert_eq!(view.members.iter().filter(|m| m.id == "a").count(), 1);
    }

    #[tokio::test]
    async fn create_with_invalid_name_touches_nothing() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames")]);

        let err = fx
            .service
            .create("a", create_payload("abc", &["b"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(fx.subjects.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.channels.writes.load(Ordering::SeqCst), 0);
        assert_eq!(fx.content.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_drops_unknown_member_ids() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames"), subject("b", "Bo", "Berg")]);

        let view = fx
            .service
            .create("a", create_payload("driving-101", &["b", "ghost"]))
            .await
            .unwrap();

        let ids: Vec<_> = view.members.iter().map(|m| m.id.as_str()).collect();
        assert!(ids.contains(&"a"));
        assert!(ids.contains(&"b"));
        assert!(!ids.contains(&"ghost"));
    }

    #[tokio::test]
    async fn create_with_unknown_creator_fails() {
        let fx = fixture();

        let err = fx
            .service
            .create("ghost", create_payload("driving-101", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnknownSubject { .. }));
        assert_eq!(fx.channels.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn create_with_image_stores_it() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames")]);

        let mut payload = create_payload("driving-101", &[]);
        payload.image = Some(png_upload());

        let view = fx.service.create("a", payload).await.unwrap();
        assert_eq!(view.image_ref.as_deref(), Some("img-1.png"));
        assert!(fx.content.stored.lock().unwrap().contains_key("img-1.png"));
    }

    #[tokio::test]
    async fn create_with_disallowed_image_type_persists_nothing() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames")]);

        let mut payload = create_payload("driving-101", &[]);
        payload.image = Some(ImageUpload {
            bytes: vec![1, 2, 3],
            content_type: "image/gif".into(),
        });

        let err = fx.service.create("a", payload).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(fx.channels.writes.load(Ordering::SeqCst), 0);
        assert!(fx.content.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_unknown_channel_fails() {
        let fx = fixture();

        let err = fx
            .service
            .edit("missing", EditChannel::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownChannel { .. }));
    }

    #[tokio::test]
    async fn edit_checks_name_before_loading() {
        let fx = fixture();

        let err = fx
            .service
            .edit(
                "whatever",
                EditChannel {
                    name: Some("abc".into()),
                    ..EditChannel::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(fx.channels.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn edit_keeps_absent_fields_and_members() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames"), subject("b", "Bo", "Berg")]);

        let created = fx
            .service
            .create(
                "a",
                CreateChannel {
                    name: "driving-101".into(),
                    description: Some("basics".into()),
                    member_ids: vec!["b".into()],
                    image: None,
                },
            )
            .await
            .unwrap();

        let edited = fx
            .service
            .edit(
                &created.id,
                EditChannel {
                    description: Some("vehicle basics".into()),
                    ..EditChannel::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.name, "driving-101");
        assert_eq!(edited.description.as_deref(), Some("vehicle basics"));
        assert_eq!(edited.members.len(), 2);
    }

    #[tokio::test]
    async fn edit_of_name_only_leaves_the_rest_untouched() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames"), subject("b", "Bo", "Berg")]);

        let created = fx
            .service
            .create(
                "a",
                CreateChannel {
                    name: "driving-101".into(),
                    description: Some("basics".into()),
                    member_ids: vec!["b".into()],
                    image: Some(png_upload()),
                },
            )
            .await
            .unwrap();

        let edited = fx
            .service
            .edit(
                &created.id,
                EditChannel {
                    name: Some("driving-201".into()),
                    ..EditChannel::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.name, "driving-201");
        assert_eq!(edited.description, created.description);
        assert_eq!(edited.image_ref, created.image_ref);
        assert_eq!(edited.members, created.members);
        assert!(fx.content.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_replaces_image_and_discards_old() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames")]);

        let mut payload = create_payload("driving-101", &[]);
        payload.image = Some(png_upload());
        let created = fx.service.create("a", payload).await.unwrap();

        let edited = fx
            .service
            .edit(
                &created.id,
                EditChannel {
                    image: Some(png_upload()),
                    ..EditChannel::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.image_ref.as_deref(), Some("img-2.png"));
        assert_eq!(*fx.content.deletes.lock().unwrap(), vec!["img-1.png"]);
    }

    #[tokio::test]
    async fn delete_removes_channel_and_image() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames")]);

        let mut payload = create_payload("driving-101", &[]);
        payload.image = Some(png_upload());
        let created = fx.service.create("a", payload).await.unwrap();

        fx.service.delete(&created.id).await.unwrap();

        assert!(matches!(
            fx.service.get(&created.id).await,
            Err(Error::UnknownChannel { .. })
        ));
        assert!(fx
            .content
            .deletes
            .lock()
            .unwrap()
            .contains(&"img-1.png".to_string()));
    }

    #[tokio::test]
    async fn delete_unknown_channel_fails() {
        let fx = fixture();
        assert!(matches!(
            fx.service.delete("missing").await,
            Err(Error::UnknownChannel { .. })
        ));
    }

    #[tokio::test]
    async fn get_projects_members_sorted_by_surname() {
        let fx = fixture();
        fx.seed(&[
            subject("t", "Nina", "Instructor"),
            subject("s1", "Carl", "Zimmer"),
            subject("s2", "Anna", "Abel"),
        ]);

        let created = fx
            .service
            .create("t", create_payload("driving-101", &["s1", "s2"]))
            .await
            .unwrap();

        let view = fx.service.get(&created.id).await.unwrap();
        let order: Vec<_> = view.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, ["s2", "t", "s1"]);
    }

    #[tokio::test]
    async fn projection_skips_members_no_longer_in_directory() {
        let fx = fixture();
        fx.seed(&[subject("a", "Ada", "Ames"), subject("b", "Bo", "Berg")]);

        let created = fx
            .service
            .create("a", create_payload("driving-101", &["b"]))
            .await
            .unwrap();

        fx.subjects.subjects.lock().unwrap().remove("b");

        let view = fx.service.get(&created.id).await.unwrap();
        let ids: Vec<_> = view.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a"]);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_membership() {
        let fx = fixture();
        fx.seed(&[
            subject("t", "Nina", "Instructor"),
            subject("s1", "Carl", "Zimmer"),
            subject("s2", "Anna", "Abel"),
        ]);

        let driving = fx
            .service
            .create("t", create_payload("driving-101", &["s1", "s2"]))
            .await
            .unwrap();
        fx.service
            .create("t", create_payload("staff-room", &[]))
            .await
            .unwrap();

        let s1_channels = fx.service.list_for_subject("s1").await.unwrap();
        assert_eq!(s1_channels.len(), 1);
        assert_eq!(s1_channels[0].id, driving.id);
        assert_eq!(s1_channels[0].name, "driving-101");

        let t_channels = fx.service.list_for_subject("t").await.unwrap();
        assert_eq!(t_channels.len(), 2);

        assert!(fx.service.list_for_subject("ghost").await.unwrap().is_empty());
    }
}
